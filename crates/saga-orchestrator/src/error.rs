use std::time::Duration;

use saga_core::StepId;
use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio::time::error::Elapsed;

/// Cause attached to [`SagaError::Cancelled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the caller cancelled its wait for the saga outcome")]
pub struct WaitCancelled;

/// Coarse classification of a [`SagaError`], for callers deciding on
/// remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A step handler failed or could not be resolved; compensation ran.
    Step,
    /// A compensator failed; rollback is partial.
    Compensation,
    /// The run exceeded its time budget.
    Timeout,
    /// The run was cancelled by the caller or at a step boundary.
    Cancelled,
    /// The worker could not be started or vanished.
    Internal,
}

/// Error from a saga run.
///
/// Step and compensator errors are carried by value so callers get the
/// original error back with its type intact.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SagaError<E> {
    /// A handler failed; every executed step was offered compensation.
    #[error("saga step '{step}' failed")]
    StepFailed {
        /// Step whose handler failed.
        step: StepId,
        /// The handler's error.
        #[source]
        source: E,
    },

    /// A compensator failed and the remaining rollback was abandoned.
    #[error("compensation of saga step '{step}' failed, remaining rollback aborted")]
    CompensationFailed {
        /// Step whose compensator failed.
        step: StepId,
        /// The compensator's error.
        #[source]
        source: E,
    },

    /// The resolver had no instance for a step id.
    #[error("no step instance could be resolved for '{step}'")]
    UnresolvedStep {
        /// The unresolved step id.
        step: StepId,
    },

    /// A cancellation was observed at a step boundary; executed steps were
    /// compensated and the run stopped.
    #[error("saga run cancelled before step '{before_step}'")]
    Interrupted {
        /// First step that did not run.
        before_step: StepId,
    },

    /// The run did not finish within its time budget.
    #[error("saga run did not complete within {timeout:?}")]
    Timeout {
        /// Budget that was exceeded.
        timeout: Duration,
        #[source]
        source: Elapsed,
    },

    /// The caller's wait was cancelled before the run finished.
    #[error("saga run cancelled by the caller")]
    Cancelled {
        #[source]
        source: WaitCancelled,
    },

    /// The worker ended without reporting an outcome (a step panicked).
    #[error("saga worker ended without reporting an outcome")]
    WorkerLost {
        #[source]
        source: RecvError,
    },

    /// The dedicated worker thread could not be started.
    #[error("failed to start saga worker")]
    WorkerSpawn {
        #[source]
        source: std::io::Error,
    },
}

impl<E> SagaError<E> {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::StepFailed { .. } | Self::UnresolvedStep { .. } => FailureKind::Step,
            Self::CompensationFailed { .. } => FailureKind::Compensation,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Interrupted { .. } | Self::Cancelled { .. } => FailureKind::Cancelled,
            Self::WorkerLost { .. } | Self::WorkerSpawn { .. } => FailureKind::Internal,
        }
    }

    /// Whether the error is a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.kind() == FailureKind::Timeout
    }

    /// Whether the error is a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.kind() == FailureKind::Cancelled
    }

    /// The step or compensator error, if that is what ended the run.
    pub fn into_step_error(self) -> Option<E> {
        match self {
            Self::StepFailed { source, .. } | Self::CompensationFailed { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("card declined")]
    struct Declined;

    #[test]
    fn step_failure_keeps_original_error() {
        let err: SagaError<Declined> = SagaError::StepFailed {
            step: StepId::from_static("charge"),
            source: Declined,
        };

        assert_eq!(err.kind(), FailureKind::Step);
        assert!(err.to_string().contains("'charge'"));
        assert_eq!(err.source().map(ToString::to_string), Some("card declined".to_string()));
        assert_eq!(err.into_step_error(), Some(Declined));
    }

    #[test]
    fn compensation_failure_is_classified_separately() {
        let err: SagaError<Declined> = SagaError::CompensationFailed {
            step: StepId::from_static("reserve"),
            source: Declined,
        };

        assert_eq!(err.kind(), FailureKind::Compensation);
        assert!(err.to_string().contains("aborted"));
    }

    #[test]
    fn cancellation_variants_share_a_kind() {
        let interrupted: SagaError<Declined> = SagaError::Interrupted {
            before_step: StepId::from_static("ship"),
        };
        let cancelled: SagaError<Declined> = SagaError::Cancelled {
            source: WaitCancelled,
        };

        assert!(interrupted.is_cancelled());
        assert!(cancelled.is_cancelled());
        assert!(cancelled.source().is_some());
        assert_eq!(cancelled.into_step_error(), None);
    }

    #[test]
    fn unresolved_step_is_a_step_failure() {
        let err: SagaError<Declined> = SagaError::UnresolvedStep {
            step: StepId::from_static("ghost"),
        };

        assert_eq!(err.kind(), FailureKind::Step);
        assert!(err.to_string().contains("'ghost'"));
    }
}
