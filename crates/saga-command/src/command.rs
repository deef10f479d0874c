use std::borrow::Borrow;
use std::fmt;

/// A request to change state, routed to exactly one handler by its kind.
pub trait Command: Send + 'static {
    /// Identifier the registry routes on. Unique per command type.
    const KIND: &'static str;

    type Output;

    type Error;
}

/// Handles one command type.
///
/// Handlers are shared across threads once the registry is built, so they
/// take `&self` and keep any mutable state behind their own synchronisation.
pub trait CommandHandler<C: Command>: Send + Sync {
    /// # Errors
    ///
    /// Returns the command's own error type when handling fails.
    fn handle(&self, command: C) -> Result<C::Output, C::Error>;
}

impl<C, F> CommandHandler<C> for F
where
    C: Command,
    F: Fn(C) -> Result<C::Output, C::Error> + Send + Sync,
{
    fn handle(&self, command: C) -> Result<C::Output, C::Error> {
        self(command)
    }
}

/// Identifier of a command kind, as declared by [`Command::KIND`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandKind(&'static str);

impl CommandKind {
    #[must_use]
    pub const fn new(kind: &'static str) -> Self {
        Self(kind)
    }

    /// The kind declared by `C`.
    #[must_use]
    pub const fn of<C: Command>() -> Self {
        Self(C::KIND)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Borrow<str> for CommandKind {
    fn borrow(&self) -> &str {
        self.0
    }
}
