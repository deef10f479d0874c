//! Configuration for the saga orchestrator and the command registry.
//!
//! Settings live under the `[pattern.saga]` and `[pattern.cqrs]` tables of a
//! TOML file. Every key is optional:
//!
//! ```toml
//! [pattern.saga]
//! enabled = true
//! default-timeout-secs = 30
//! cancellation = "compensate-and-stop"
//!
//! [pattern.cqrs]
//! enabled = true
//! duplicate-commands = "last-wins"
//! ```

mod config;
mod error;
mod manifest;

pub use config::{CqrsSettings, PatternConfig, SagaSettings};
pub use error::ConfigError;
