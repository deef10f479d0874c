use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::key::StepId;
use crate::step::SagaStep;

/// Resolves a step id to the step instance that implements it.
///
/// Normally backed by whatever component container owns the step instances.
/// Closures of the matching shape implement this trait.
pub trait StepResolver<R, E>: Send + Sync {
    /// Look up the instance for `step`, or `None` if nothing provides it.
    fn resolve(&self, step: &StepId) -> Option<Arc<SagaStep<R, E>>>;
}

impl<R, E, F> StepResolver<R, E> for F
where
    F: Fn(&StepId) -> Option<Arc<SagaStep<R, E>>> + Send + Sync,
{
    fn resolve(&self, step: &StepId) -> Option<Arc<SagaStep<R, E>>> {
        self(step)
    }
}

/// In-memory [`StepResolver`] holding one instance per step id.
pub struct StepCatalog<R, E> {
    steps: HashMap<StepId, Arc<SagaStep<R, E>>>,
}

impl<R, E> StepCatalog<R, E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
        }
    }

    /// Add `step` under `id`, replacing any previous instance.
    #[must_use]
    pub fn with_step(mut self, id: impl Into<StepId>, step: SagaStep<R, E>) -> Self {
        self.insert(id, step);
        self
    }

    pub fn insert(&mut self, id: impl Into<StepId>, step: SagaStep<R, E>) {
        self.steps.insert(id.into(), Arc::new(step));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<R, E> Default for StepCatalog<R, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, E> fmt::Debug for StepCatalog<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepCatalog")
            .field("steps", &self.steps.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<R, E> StepResolver<R, E> for StepCatalog<R, E> {
    fn resolve(&self, step: &StepId) -> Option<Arc<SagaStep<R, E>>> {
        self.steps.get(step).cloned()
    }
}
