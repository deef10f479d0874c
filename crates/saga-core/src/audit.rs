use std::time::Instant;

use crate::key::StepId;

/// Status of a step in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    /// Handler started and has not returned yet.
    Running,
    /// Handler completed successfully.
    Executed,
    /// Handler returned an error.
    Failed,
    /// Compensator ran successfully.
    Compensated,
    /// Step declares no compensator; rollback passed over it.
    CompensationSkipped,
    /// Compensator returned an error, aborting the rollback.
    CompensationFailed,
}

/// Record of one step's execution in a saga run.
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// Identifier the step was resolved by.
    pub step: StepId,
    /// Display name declared by the step instance.
    pub name: String,
    /// Current status.
    pub status: StepStatus,
    /// When the handler started.
    pub started_at: Instant,
    /// When the last transition (execution or compensation) finished.
    pub completed_at: Option<Instant>,
}

/// Audit log tracking step executions and compensations of one run.
#[derive(Debug, Clone, Default)]
pub struct SagaAuditLog {
    records: Vec<StepRecord>,
}

impl SagaAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step handler starting.
    pub fn record_start(&mut self, step: &StepId, name: &str) {
        self.records.push(StepRecord {
            step: step.clone(),
            name: name.to_string(),
            status: StepStatus::Running,
            started_at: Instant::now(),
            completed_at: None,
        });
    }

    /// Mark the last started step as executed.
    pub fn record_success(&mut self) {
        self.finish_last(StepStatus::Executed);
    }

    /// Mark the last started step as failed.
    pub fn record_failure(&mut self) {
        self.finish_last(StepStatus::Failed);
    }

    pub fn record_compensated(&mut self, step: &StepId) {
        self.finish_matching(step, StepStatus::Compensated);
    }

    pub fn record_compensation_skipped(&mut self, step: &StepId) {
        self.finish_matching(step, StepStatus::CompensationSkipped);
    }

    pub fn record_compensation_failed(&mut self, step: &StepId) {
        self.finish_matching(step, StepStatus::CompensationFailed);
    }

    fn finish_last(&mut self, status: StepStatus) {
        if let Some(record) = self.records.last_mut() {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    fn finish_matching(&mut self, step: &StepId, status: StepStatus) {
        for record in &mut self.records {
            if &record.step == step {
                record.status = status;
                record.completed_at = Some(Instant::now());
            }
        }
    }

    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Status of `step`, if it was started in this run.
    #[must_use]
    pub fn status_of(&self, step: &StepId) -> Option<StepStatus> {
        self.records
            .iter()
            .find(|record| &record.step == step)
            .map(|record| record.status)
    }

    /// Get a summary of the saga execution for display.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.records {
            let status = match record.status {
                StepStatus::Running => "…",
                StepStatus::Executed => "✓",
                StepStatus::Failed => "✗",
                StepStatus::Compensated => "↩",
                StepStatus::CompensationSkipped => "-",
                StepStatus::CompensationFailed => "⚠",
            };
            lines.push(format!("{status} {}", record.name));
        }
        lines.join("\n")
    }
}
