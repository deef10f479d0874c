//! Saga orchestration with reverse-order compensation.
//!
//! [`Orchestrator::run`] executes the steps of a
//! [`SagaDefinition`](saga_core::SagaDefinition) in order on a dedicated
//! worker. When a handler fails, every executed step (the failing one
//! included) is offered compensation from last to first, then the handler's
//! error is returned. Runs are bounded by a timeout and can be cancelled;
//! cancellation is cooperative and only observed between steps.

mod config;
mod error;
mod executor;
mod orchestrator;

pub use config::{DEFAULT_TIMEOUT, OrchestratorConfig};
pub use error::{FailureKind, SagaError, WaitCancelled};
pub use orchestrator::Orchestrator;
pub use tokio_util::sync::CancellationToken;
