//! Command handler registry.
//!
//! Handlers are collected once at startup, either one by one through
//! [`RegistryBuilder::register`] or by scanning a set of
//! [`CommandComponent`]s, and frozen into an immutable [`CommandRegistry`].
//! The registry is then shared by reference and read concurrently; lookups
//! for unknown command kinds return `None` rather than failing.
//!
//! ```
//! use std::sync::Arc;
//!
//! use saga_command::{Command, CommandHandler, CommandRegistry};
//!
//! struct Ping;
//!
//! impl Command for Ping {
//!     const KIND: &'static str = "ping";
//!     type Output = &'static str;
//!     type Error = std::convert::Infallible;
//! }
//!
//! struct Pong;
//!
//! impl CommandHandler<Ping> for Pong {
//!     fn handle(&self, _command: Ping) -> Result<&'static str, std::convert::Infallible> {
//!         Ok("pong")
//!     }
//! }
//!
//! let mut builder = CommandRegistry::builder();
//! builder.register::<Ping, _>(Arc::new(Pong)).expect("first registration");
//! let registry = builder.build();
//!
//! assert_eq!(registry.dispatch(Ping).expect("registered"), "pong");
//! assert!(registry.get_by_kind("unknown").is_none());
//! ```

mod binding;
mod command;
mod error;
mod registry;

pub use binding::{CommandBinding, CommandComponent};
pub use command::{Command, CommandHandler, CommandKind};
pub use error::{DispatchError, RegistryError};
pub use registry::{CommandRegistry, RegistryBuilder};
pub use saga_core::DuplicatePolicy;
