use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::audit::SagaAuditLog;
use crate::key::StepId;

#[derive(Debug, Default)]
struct Inner {
    current_step: Option<StepId>,
    complete: bool,
    error_occurred: bool,
    audit_log: SagaAuditLog,
}

/// Run state of one saga, shared between the caller and the worker
/// executing it.
///
/// Invariants held by every method:
/// - completion is monotonic (`false` to `true`, never back);
/// - once complete, there is no current step and none can be set.
#[derive(Debug, Default)]
pub struct SagaState {
    inner: Mutex<Inner>,
}

impl SagaState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Step whose handler is running or last ran, cleared on completion.
    #[must_use]
    pub fn current_step(&self) -> Option<StepId> {
        self.lock().current_step.clone()
    }

    #[must_use]
    pub fn is_complete_execution(&self) -> bool {
        self.lock().complete
    }

    #[must_use]
    pub fn is_error_occurred(&self) -> bool {
        self.lock().error_occurred
    }

    pub fn set_error_occurred(&self, value: bool) {
        self.lock().error_occurred = value;
    }

    /// Record `step` as current unless the run is already complete.
    ///
    /// The check and the update happen under one lock, so a concurrent
    /// [`mark_complete`](Self::mark_complete) can never be followed by a
    /// new current step. Returns whether the step may run.
    pub fn begin_step(&self, step: &StepId) -> bool {
        let mut inner = self.lock();
        if inner.complete {
            return false;
        }
        inner.current_step = Some(step.clone());
        true
    }

    /// Mark the run complete and clear the current step. Idempotent.
    pub fn mark_complete(&self) {
        let mut inner = self.lock();
        inner.current_step = None;
        inner.complete = true;
    }

    /// Update the audit log in place.
    pub fn record(&self, f: impl FnOnce(&mut SagaAuditLog)) {
        f(&mut self.lock().audit_log);
    }

    /// Snapshot of the audit log.
    #[must_use]
    pub fn audit_log(&self) -> SagaAuditLog {
        self.lock().audit_log.clone()
    }
}
