use std::time::Duration;

use saga_core::CancellationPolicy;

/// Default time budget for one run when the caller does not pass one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every run of an [`Orchestrator`](crate::Orchestrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    default_timeout: Duration,
    cancellation_policy: CancellationPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            cancellation_policy: CancellationPolicy::default(),
        }
    }
}

impl OrchestratorConfig {
    #[must_use]
    pub fn new(default_timeout: Duration, cancellation_policy: CancellationPolicy) -> Self {
        Self {
            default_timeout,
            cancellation_policy,
        }
    }

    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    #[must_use]
    pub fn cancellation_policy(&self) -> CancellationPolicy {
        self.cancellation_policy
    }

    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_cancellation_policy(mut self, policy: CancellationPolicy) -> Self {
        self.cancellation_policy = policy;
        self
    }
}
