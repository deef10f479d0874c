//! Core types for saga orchestration.
//!
//! A saga is an ordered list of steps that share one mutable [`Payload`].
//! Each step bundles a required handler with an optional compensator; when a
//! step fails, the steps already executed are compensated in reverse order.
//! This crate holds the data model; driving a run is the job of
//! `saga-orchestrator`.

mod audit;
mod definition;
mod error;
mod key;
mod payload;
mod policy;
mod resolver;
mod state;
mod step;

pub use audit::{SagaAuditLog, StepRecord, StepStatus};
pub use definition::{SagaDefinition, SagaDefinitionBuilder};
pub use error::{PayloadError, SagaDefinitionError};
pub use key::{PayloadKey, StepId};
pub use payload::Payload;
pub use policy::{CancellationPolicy, DuplicatePolicy};
pub use resolver::{StepCatalog, StepResolver};
pub use state::SagaState;
pub use step::{SagaStep, StepCompensator, StepHandler};
pub use uuid::Uuid;
