use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use saga_core::{
    CancellationPolicy, Payload, SagaAuditLog, SagaDefinition, SagaState, SagaStep, StepId,
    StepResolver,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn};

use crate::error::SagaError;

/// Steps whose handler has been invoked, in execution order.
type Executed<R, E> = Vec<(StepId, Arc<SagaStep<R, E>>)>;

/// Drives one saga definition on the current thread.
///
/// Cancellation is cooperative: the token is only consulted between steps,
/// never while a handler or compensator is running.
pub(crate) struct Executor {
    policy: CancellationPolicy,
    token: CancellationToken,
}

impl Executor {
    pub(crate) fn new(policy: CancellationPolicy, token: CancellationToken) -> Self {
        Self { policy, token }
    }

    /// Run every step of `saga` and return the payload's result.
    ///
    /// The saga is marked complete on every exit path. A panicking handler
    /// still triggers compensation before the panic is resumed.
    pub(crate) fn execute<R, E, S>(
        &self,
        mut saga: SagaDefinition<R>,
        resolver: &S,
    ) -> Result<R, SagaError<E>>
    where
        S: StepResolver<R, E> + ?Sized,
    {
        let span = info_span!("saga", saga_key = %saga.key(), saga = saga.name());
        let _entered = span.enter();

        let state = saga.state();
        let outcome = self.execute_steps(&mut saga, &state, resolver);
        if outcome.is_err() {
            state.set_error_occurred(true);
        }
        state.mark_complete();

        outcome.map(|()| saga.into_payload().into_result())
    }

    fn execute_steps<R, E, S>(
        &self,
        saga: &mut SagaDefinition<R>,
        state: &SagaState,
        resolver: &S,
    ) -> Result<(), SagaError<E>>
    where
        S: StepResolver<R, E> + ?Sized,
    {
        let steps = saga.required_steps().to_vec();
        let mut executed: Executed<R, E> = Vec::with_capacity(steps.len());
        let mut cancellation_handled = false;

        for id in steps {
            if !cancellation_handled && self.token.is_cancelled() {
                cancellation_handled = true;
                info!(before_step = %id, policy = %self.policy, "cancellation observed at step boundary");
                compensate(saga.payload_mut(), state, &executed)?;
                if self.policy == CancellationPolicy::CompensateAndStop {
                    return Err(SagaError::Interrupted { before_step: id });
                }
                // Already rolled back; a later failure must not undo them twice.
                executed.clear();
            }

            let Some(step) = resolver.resolve(&id) else {
                error!(step = %id, "no step instance resolved");
                compensate(saga.payload_mut(), state, &executed)?;
                return Err(SagaError::UnresolvedStep { step: id });
            };

            if !state.begin_step(&id) {
                // Completed from outside (timeout or caller cancellation) before
                // the token was observed.
                info!(before_step = %id, "saga already completed, stopping");
                if !cancellation_handled {
                    compensate(saga.payload_mut(), state, &executed)?;
                }
                return Err(SagaError::Interrupted { before_step: id });
            }

            info!(step = step.name(), "executing saga step");
            state.record(|log| log.record_start(&id, step.name()));
            executed.push((id.clone(), Arc::clone(&step)));

            let handled =
                panic::catch_unwind(AssertUnwindSafe(|| step.handler().handle(saga.payload_mut())));
            let outcome = match handled {
                Ok(outcome) => outcome,
                Err(panic) => {
                    state.record(SagaAuditLog::record_failure);
                    error!(step = step.name(), "saga step panicked");
                    if compensate(saga.payload_mut(), state, &executed).is_err() {
                        error!(step = step.name(), "compensation after panic failed");
                    }
                    state.set_error_occurred(true);
                    state.mark_complete();
                    panic::resume_unwind(panic);
                }
            };
            if let Err(source) = outcome {
                state.record(SagaAuditLog::record_failure);
                warn!(step = step.name(), "saga step failed");
                compensate(saga.payload_mut(), state, &executed)?;
                return Err(SagaError::StepFailed { step: id, source });
            }
            state.record(SagaAuditLog::record_success);
        }

        Ok(())
    }
}

/// Offer compensation to `executed` steps in reverse order.
///
/// Steps without a compensator are skipped. The first compensator error is
/// returned immediately and the remaining steps are left as they are.
fn compensate<R, E>(
    payload: &mut Payload<R>,
    state: &SagaState,
    executed: &[(StepId, Arc<SagaStep<R, E>>)],
) -> Result<(), SagaError<E>> {
    info!(steps = executed.len(), "triggering compensation");

    for (id, step) in executed.iter().rev() {
        let Some(compensator) = step.compensator() else {
            info!(step = step.name(), "no compensator declared, skipping");
            state.record(|log| log.record_compensation_skipped(id));
            continue;
        };

        info!(step = step.name(), "running compensator");
        if let Err(source) = compensator.compensate(payload) {
            error!(step = step.name(), "compensator failed, aborting remaining rollback");
            state.record(|log| log.record_compensation_failed(id));
            return Err(SagaError::CompensationFailed {
                step: id.clone(),
                source,
            });
        }
        state.record(|log| log.record_compensated(id));
    }

    Ok(())
}
