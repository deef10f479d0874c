use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::SagaDefinitionError;
use crate::key::StepId;
use crate::payload::Payload;
use crate::state::SagaState;

/// One business transaction: an ordered list of steps, the payload they
/// share, and the run state.
///
/// A definition is built per transaction, handed to the orchestrator, and
/// discarded after the run. The run state lives behind an [`Arc`] so the
/// caller can keep observing it after the definition has moved to a worker:
///
/// ```
/// use saga_core::{Payload, SagaDefinition};
///
/// let saga: SagaDefinition<u32> = SagaDefinition::builder("checkout")
///     .step("reserve")
///     .step("charge")
///     .payload(Payload::new())
///     .build()?;
///
/// let state = saga.state();
/// assert!(!state.is_complete_execution());
/// assert_eq!(saga.required_steps().len(), 2);
/// # Ok::<(), saga_core::SagaDefinitionError>(())
/// ```
#[derive(Debug)]
pub struct SagaDefinition<R> {
    name: String,
    key: Uuid,
    required_steps: Vec<StepId>,
    payload: Payload<R>,
    state: Arc<SagaState>,
}

impl<R> SagaDefinition<R> {
    pub fn builder(name: impl Into<String>) -> SagaDefinitionBuilder<R> {
        SagaDefinitionBuilder {
            name: name.into(),
            key: None,
            required_steps: Vec::new(),
            payload: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn key(&self) -> Uuid {
        self.key
    }

    /// Step ids in execution order.
    #[must_use]
    pub fn required_steps(&self) -> &[StepId] {
        &self.required_steps
    }

    #[must_use]
    pub fn payload(&self) -> &Payload<R> {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload<R> {
        &mut self.payload
    }

    pub fn into_payload(self) -> Payload<R> {
        self.payload
    }

    /// Shared handle to the run state.
    #[must_use]
    pub fn state(&self) -> Arc<SagaState> {
        Arc::clone(&self.state)
    }

    #[must_use]
    pub fn current_step(&self) -> Option<StepId> {
        self.state.current_step()
    }

    #[must_use]
    pub fn is_complete_execution(&self) -> bool {
        self.state.is_complete_execution()
    }

    #[must_use]
    pub fn is_error_occurred(&self) -> bool {
        self.state.is_error_occurred()
    }

    pub fn set_error_occurred(&self, value: bool) {
        self.state.set_error_occurred(value);
    }
}

/// Builder for [`SagaDefinition`].
#[derive(Debug)]
#[must_use]
pub struct SagaDefinitionBuilder<R> {
    name: String,
    key: Option<Uuid>,
    required_steps: Vec<StepId>,
    payload: Option<Payload<R>>,
}

impl<R> SagaDefinitionBuilder<R> {
    /// Set the saga key. A random v4 key is used when none is given.
    pub fn key(mut self, key: Uuid) -> Self {
        self.key = Some(key);
        self
    }

    /// Append one step id.
    pub fn step(mut self, step: impl Into<StepId>) -> Self {
        self.required_steps.push(step.into());
        self
    }

    /// Append several step ids, in order.
    pub fn steps<I>(mut self, steps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<StepId>,
    {
        self.required_steps.extend(steps.into_iter().map(Into::into));
        self
    }

    pub fn payload(mut self, payload: Payload<R>) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Validate and produce the definition.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDefinitionError::DuplicateStep`] if a step id is listed
    /// more than once.
    pub fn build(self) -> Result<SagaDefinition<R>, SagaDefinitionError>
    where
        R: Default,
    {
        let mut seen = HashSet::new();
        for step in &self.required_steps {
            if !seen.insert(step) {
                return Err(SagaDefinitionError::DuplicateStep {
                    saga: self.name.clone(),
                    step: step.clone(),
                });
            }
        }

        Ok(SagaDefinition {
            name: self.name,
            key: self.key.unwrap_or_else(Uuid::new_v4),
            required_steps: self.required_steps,
            payload: self.payload.unwrap_or_default(),
            state: Arc::new(SagaState::new()),
        })
    }
}
