use thiserror::Error;

use crate::key::StepId;

/// Error reading a payload property.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PayloadError {
    /// An entry exists under the key's id but was stored with another type.
    #[error("payload property '{key}' holds a value of type {found}, not {expected}")]
    TypeMismatch {
        /// Id of the colliding key.
        key: String,
        /// Type declared by the key used for the read.
        expected: &'static str,
        /// Type of the value actually stored.
        found: &'static str,
    },
}

/// Error building a saga definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SagaDefinitionError {
    /// The same step id was listed twice.
    #[error("step '{step}' is listed more than once in saga '{saga}'")]
    DuplicateStep {
        /// Name of the saga being built.
        saga: String,
        /// The repeated step id.
        step: StepId,
    },
}
