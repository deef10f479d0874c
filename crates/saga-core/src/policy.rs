use std::fmt;

use serde::{Deserialize, Serialize};

/// What a run does after compensating in response to a cancellation seen at
/// a step boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CancellationPolicy {
    /// Compensate the executed steps, then stop the run.
    #[default]
    CompensateAndStop,
    /// Compensate the executed steps, then keep executing the remaining
    /// steps. Reproduces the legacy fall-through behaviour.
    CompensateAndContinue,
}

impl fmt::Display for CancellationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CompensateAndStop => "compensate-and-stop",
            Self::CompensateAndContinue => "compensate-and-continue",
        };
        write!(f, "{s}")
    }
}

/// How a command registry treats a second handler for an already
/// registered command kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The later registration replaces the earlier one.
    #[default]
    LastWins,
    /// A second registration is an error.
    Reject,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::LastWins => "last-wins",
            Self::Reject => "reject",
        };
        write!(f, "{s}")
    }
}
