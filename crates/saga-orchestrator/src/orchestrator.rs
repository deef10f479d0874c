use std::sync::Arc;
use std::thread;
use std::time::Duration;

use saga_core::{SagaDefinition, SagaState, StepResolver};
use tokio::sync::oneshot;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use crate::config::OrchestratorConfig;
use crate::error::{SagaError, WaitCancelled};
use crate::executor::Executor;

/// Executes saga definitions against externally supplied step instances.
///
/// Each supervised run gets a fresh dedicated worker thread; steps within a
/// run execute strictly one after another on that thread. The caller waits
/// for the outcome with a bounded wait. When the bound is exceeded or the
/// caller cancels, the worker is signalled and the caller gets a classified
/// error straight away; the worker notices the signal at its next step
/// boundary, compensates what it executed, and stops.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: OrchestratorConfig,
}

impl Orchestrator {
    #[must_use]
    pub fn new(config: OrchestratorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run `saga` on a dedicated worker, waiting at most `timeout`.
    ///
    /// On success returns the payload's result. On a handler failure the
    /// executed steps (including the failing one) are offered compensation
    /// in reverse order before the handler's error is returned.
    ///
    /// # Errors
    ///
    /// See [`SagaError`]; a run that exceeds `timeout` yields
    /// [`SagaError::Timeout`].
    pub async fn run<R, E, S>(
        &self,
        saga: SagaDefinition<R>,
        resolver: Arc<S>,
        timeout: Duration,
    ) -> Result<R, SagaError<E>>
    where
        R: Send + 'static,
        E: Send + 'static,
        S: StepResolver<R, E> + ?Sized + 'static,
    {
        self.run_until_cancelled(saga, resolver, timeout, &CancellationToken::new())
            .await
    }

    /// [`run`](Self::run) with the configured default timeout.
    ///
    /// # Errors
    ///
    /// See [`SagaError`].
    pub async fn run_with_default_timeout<R, E, S>(
        &self,
        saga: SagaDefinition<R>,
        resolver: Arc<S>,
    ) -> Result<R, SagaError<E>>
    where
        R: Send + 'static,
        E: Send + 'static,
        S: StepResolver<R, E> + ?Sized + 'static,
    {
        self.run(saga, resolver, self.config.default_timeout()).await
    }

    /// [`run`](Self::run), additionally giving up when `cancel` fires.
    ///
    /// The worker's token is a child of `cancel`, so cancelling the caller
    /// also signals the worker. `cancel` itself stays cancelled, leaving the
    /// caller's own context in the cancelled state for its callers.
    ///
    /// Dropping the returned future before it resolves is treated like a
    /// cancellation: the run is marked complete and failed, and the worker
    /// compensates at its next step boundary.
    ///
    /// # Errors
    ///
    /// Returns [`SagaError::Cancelled`] when `cancel` fires first, plus
    /// everything [`run`](Self::run) can return.
    pub async fn run_until_cancelled<R, E, S>(
        &self,
        saga: SagaDefinition<R>,
        resolver: Arc<S>,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<R, SagaError<E>>
    where
        R: Send + 'static,
        E: Send + 'static,
        S: StepResolver<R, E> + ?Sized + 'static,
    {
        let state = saga.state();
        let saga_key = saga.key();
        let worker_token = cancel.child_token();
        let executor = Executor::new(self.config.cancellation_policy(), worker_token.clone());
        let (tx, rx) = oneshot::channel();

        let spawned = thread::Builder::new()
            .name(format!("saga-{saga_key}"))
            .spawn(move || {
                let outcome = executor.execute(saga, resolver.as_ref());
                // The supervisor may have stopped listening after a timeout.
                let _ = tx.send(outcome);
            });
        if let Err(source) = spawned {
            state.set_error_occurred(true);
            state.mark_complete();
            return Err(SagaError::WorkerSpawn { source });
        }
        debug!(%saga_key, ?timeout, "saga worker started");
        let guard = WorkerGuard::new(state, worker_token);

        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                warn!(%saga_key, "caller cancelled saga run");
                Err(SagaError::Cancelled { source: WaitCancelled })
            }
            outcome = tokio::time::timeout(timeout, rx) => match outcome {
                Ok(Ok(result)) => {
                    guard.disarm();
                    result
                }
                Ok(Err(source)) => {
                    warn!(%saga_key, "saga worker ended without an outcome");
                    Err(SagaError::WorkerLost { source })
                }
                Err(source) => {
                    warn!(%saga_key, ?timeout, "saga run timed out, cancelling worker");
                    Err(SagaError::Timeout { timeout, source })
                }
            },
        }
    }

    /// Run `saga` on the current thread without a time bound.
    ///
    /// `cancel` is checked at every step boundary. This is the only entry
    /// point where [`CancellationPolicy::CompensateAndContinue`] can resume
    /// execution after compensating, since supervised runs are completed by
    /// the supervisor as soon as they time out or are cancelled.
    ///
    /// [`CancellationPolicy::CompensateAndContinue`]: saga_core::CancellationPolicy::CompensateAndContinue
    ///
    /// # Errors
    ///
    /// See [`SagaError`].
    pub fn execute<R, E, S>(
        &self,
        saga: SagaDefinition<R>,
        resolver: &S,
        cancel: &CancellationToken,
    ) -> Result<R, SagaError<E>>
    where
        S: StepResolver<R, E> + ?Sized,
    {
        Executor::new(self.config.cancellation_policy(), cancel.clone()).execute(saga, resolver)
    }
}

/// Fails the run and signals its worker unless the outcome was delivered.
///
/// Also fires when the supervising future is dropped mid-wait.
struct WorkerGuard {
    state: Option<Arc<SagaState>>,
    token: Option<DropGuard>,
}

impl WorkerGuard {
    fn new(state: Arc<SagaState>, token: CancellationToken) -> Self {
        Self {
            state: Some(state),
            token: Some(token.drop_guard()),
        }
    }

    fn disarm(mut self) {
        self.state = None;
        if let Some(token) = self.token.take() {
            drop(token.disarm());
        }
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            state.set_error_occurred(true);
            state.mark_complete();
        }
        // `token` is dropped after this, cancelling the worker.
    }
}
