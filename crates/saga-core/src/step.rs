use std::borrow::Cow;
use std::fmt;

use crate::payload::Payload;

/// The required unit of work of a saga step.
///
/// A handler may mutate the payload in place. Any closure of the matching
/// shape implements this trait.
pub trait StepHandler<R, E>: Send + Sync {
    /// Run the step against the shared payload.
    ///
    /// # Errors
    ///
    /// Returns the step's own error; the orchestrator compensates and then
    /// hands this error back to the caller unchanged.
    fn handle(&self, payload: &mut Payload<R>) -> Result<(), E>;
}

/// Optional rollback action for a saga step.
pub trait StepCompensator<R, E>: Send + Sync {
    /// Undo the effects of the step's handler.
    ///
    /// # Errors
    ///
    /// A failing compensator aborts the remaining rollback.
    fn compensate(&self, payload: &mut Payload<R>) -> Result<(), E>;
}

impl<R, E, F> StepHandler<R, E> for F
where
    F: Fn(&mut Payload<R>) -> Result<(), E> + Send + Sync,
{
    fn handle(&self, payload: &mut Payload<R>) -> Result<(), E> {
        self(payload)
    }
}

impl<R, E, F> StepCompensator<R, E> for F
where
    F: Fn(&mut Payload<R>) -> Result<(), E> + Send + Sync,
{
    fn compensate(&self, payload: &mut Payload<R>) -> Result<(), E> {
        self(payload)
    }
}

/// Capability set of one saga step: a name for diagnostics, a handler, and
/// an optional compensator.
///
/// ```
/// use saga_core::{Payload, SagaStep};
///
/// let step: SagaStep<u32, String> =
///     SagaStep::new("charge", |p: &mut Payload<u32>| -> Result<(), String> {
///         p.set_result(42);
///         Ok(())
///     })
///     .with_compensator(|_: &mut Payload<u32>| -> Result<(), String> { Ok(()) });
///
/// assert_eq!(step.name(), "charge");
/// assert!(step.compensator().is_some());
/// ```
pub struct SagaStep<R, E> {
    name: Cow<'static, str>,
    handler: Box<dyn StepHandler<R, E>>,
    compensator: Option<Box<dyn StepCompensator<R, E>>>,
}

impl<R, E> SagaStep<R, E> {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        handler: impl StepHandler<R, E> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            handler: Box::new(handler),
            compensator: None,
        }
    }

    #[must_use]
    pub fn with_compensator(mut self, compensator: impl StepCompensator<R, E> + 'static) -> Self {
        self.compensator = Some(Box::new(compensator));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn handler(&self) -> &dyn StepHandler<R, E> {
        self.handler.as_ref()
    }

    #[must_use]
    pub fn compensator(&self) -> Option<&dyn StepCompensator<R, E>> {
        self.compensator.as_deref()
    }
}

impl<R, E> fmt::Debug for SagaStep<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SagaStep")
            .field("name", &self.name)
            .field("has_compensator", &self.compensator.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct TestError(&'static str);

    struct Doubler;

    impl StepHandler<i32, TestError> for Doubler {
        fn handle(&self, payload: &mut Payload<i32>) -> Result<(), TestError> {
            let doubled = payload.result() * 2;
            payload.set_result(doubled);
            Ok(())
        }
    }

    #[test]
    fn struct_handler_mutates_payload() {
        let step: SagaStep<i32, TestError> = SagaStep::new("double", Doubler);
        let mut payload = Payload::with_result(21);

        let result = step.handler().handle(&mut payload);

        assert_eq!(result, Ok(()));
        assert_eq!(*payload.result(), 42);
    }

    #[test]
    fn closure_handler_propagates_error() {
        let step = SagaStep::new(
            "fail",
            |_: &mut Payload<i32>| -> Result<(), TestError> { Err(TestError("boom")) },
        );
        let mut payload = Payload::new();

        assert_eq!(step.handler().handle(&mut payload), Err(TestError("boom")));
    }

    #[test]
    fn step_without_compensator_reports_none() {
        let step: SagaStep<i32, TestError> = SagaStep::new("read_only", Doubler);

        assert!(step.compensator().is_none());
    }

    #[test]
    fn compensator_runs_against_payload() {
        let step = SagaStep::new("double", Doubler).with_compensator(
            |payload: &mut Payload<i32>| -> Result<(), TestError> {
                payload.set_result(0);
                Ok(())
            },
        );
        let mut payload = Payload::with_result(9);

        let compensator = step.compensator().expect("compensator is declared");
        assert_eq!(compensator.compensate(&mut payload), Ok(()));
        assert_eq!(*payload.result(), 0);
    }

    #[test]
    fn debug_shows_name_and_compensator_flag() {
        let step: SagaStep<i32, TestError> = SagaStep::new("double", Doubler);

        let rendered = format!("{step:?}");

        assert!(rendered.contains("double"));
        assert!(rendered.contains("has_compensator: false"));
    }
}
