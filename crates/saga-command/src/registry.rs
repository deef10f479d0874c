use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use saga_core::DuplicatePolicy;
use tracing::{debug, warn};

use crate::binding::{CommandBinding, CommandComponent};
use crate::command::{Command, CommandHandler, CommandKind};
use crate::error::{DispatchError, RegistryError};

/// Collects command handlers during startup.
///
/// Call [`build`](Self::build) once initialization is done; the resulting
/// [`CommandRegistry`] cannot be modified.
#[derive(Debug, Default)]
#[must_use]
pub struct RegistryBuilder {
    policy: DuplicatePolicy,
    bindings: IndexMap<CommandKind, CommandBinding>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Register `handler` for the kind declared by `C`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKind`] when `C`'s kind is already
    /// registered and the policy is [`DuplicatePolicy::Reject`].
    pub fn register<C, H>(&mut self, handler: Arc<H>) -> Result<&mut Self, RegistryError>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        self.bind(CommandBinding::of::<C, H>(handler))
    }

    /// Add a prepared binding.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn bind(&mut self, binding: CommandBinding) -> Result<&mut Self, RegistryError> {
        let kind = binding.kind();
        match self.bindings.entry(kind) {
            Entry::Vacant(slot) => {
                debug!(%kind, handler = binding.handler_type(), "registered command handler");
                slot.insert(binding);
            }
            Entry::Occupied(mut slot) => match self.policy {
                DuplicatePolicy::LastWins => {
                    warn!(
                        %kind,
                        previous = slot.get().handler_type(),
                        handler = binding.handler_type(),
                        "command kind registered twice, replacing earlier handler"
                    );
                    slot.insert(binding);
                }
                DuplicatePolicy::Reject => {
                    return Err(RegistryError::DuplicateKind {
                        kind,
                        existing: slot.get().handler_type(),
                        rejected: binding.handler_type(),
                    });
                }
            },
        }
        Ok(self)
    }

    /// Startup scan: register every component that declares a command kind.
    ///
    /// Components are visited in iteration order, so with
    /// [`DuplicatePolicy::LastWins`] the last component declaring a kind
    /// ends up handling it. Returns how many components were registered.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register). Components visited before the
    /// failing one stay registered.
    pub fn scan<I>(&mut self, components: I) -> Result<usize, RegistryError>
    where
        I: IntoIterator<Item = Arc<dyn CommandComponent>>,
    {
        let mut registered = 0;
        for component in components {
            if let Some(binding) = component.command_binding() {
                self.bind(binding)?;
                registered += 1;
            }
        }
        debug!(registered, "command component scan finished");
        Ok(registered)
    }

    pub fn build(self) -> CommandRegistry {
        debug!(
            commands = self.bindings.len(),
            policy = %self.policy,
            "command registry built"
        );
        CommandRegistry {
            bindings: self.bindings,
        }
    }
}

/// Immutable mapping from command kind to handler.
///
/// Safe to share across threads; lookups take `&self` and never fail.
#[derive(Default)]
pub struct CommandRegistry {
    bindings: IndexMap<CommandKind, CommandBinding>,
}

impl CommandRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The handler registered for `C`, or `None` if there is none.
    ///
    /// Also `None` when the kind is registered for a different command type
    /// that happens to declare the same kind.
    #[must_use]
    pub fn get<C: Command>(&self) -> Option<Arc<dyn CommandHandler<C>>> {
        let handler = self
            .bindings
            .get(C::KIND)
            .and_then(CommandBinding::handler::<C>);
        if handler.is_none() {
            debug!(kind = C::KIND, "no command handler found");
        }
        handler
    }

    /// The binding registered under `kind`, or `None` for unknown kinds.
    #[must_use]
    pub fn get_by_kind(&self, kind: &str) -> Option<&CommandBinding> {
        self.bindings.get(kind)
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.bindings.contains_key(kind)
    }

    /// Registered kinds in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = CommandKind> + '_ {
        self.bindings.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Route `command` to its handler.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::HandlerNotFound`] when no handler is
    /// registered for `C`, and [`DispatchError::Handler`] carrying the
    /// handler's own error when it fails.
    pub fn dispatch<C: Command>(&self, command: C) -> Result<C::Output, DispatchError<C::Error>> {
        let kind = CommandKind::of::<C>();
        let handler = self
            .get::<C>()
            .ok_or(DispatchError::HandlerNotFound { kind })?;
        debug!(%kind, "dispatching command");
        handler
            .handle(command)
            .map_err(|source| DispatchError::Handler { kind, source })
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("kinds", &self.bindings.keys().collect::<Vec<_>>())
            .finish()
    }
}
