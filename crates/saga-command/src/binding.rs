use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::command::{Command, CommandHandler, CommandKind};

/// A handler paired with the command kind it serves.
///
/// The handler is stored type-erased so that bindings for different command
/// types can live in one registry. It is recovered by downcasting to
/// `Arc<dyn CommandHandler<C>>` with the `C` the caller asks for.
pub struct CommandBinding {
    kind: CommandKind,
    command_type: &'static str,
    handler_type: &'static str,
    handler: Box<dyn Any + Send + Sync>,
}

impl CommandBinding {
    /// Bind `handler` to the kind declared by `C`.
    pub fn of<C, H>(handler: Arc<H>) -> Self
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let handler: Arc<dyn CommandHandler<C>> = handler;
        Self {
            kind: CommandKind::of::<C>(),
            command_type: type_name::<C>(),
            handler_type: type_name::<H>(),
            handler: Box::new(handler),
        }
    }

    #[must_use]
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    #[must_use]
    pub fn command_type(&self) -> &'static str {
        self.command_type
    }

    #[must_use]
    pub fn handler_type(&self) -> &'static str {
        self.handler_type
    }

    /// The handler, if this binding was made for command type `C`.
    #[must_use]
    pub fn handler<C: Command>(&self) -> Option<Arc<dyn CommandHandler<C>>> {
        self.handler
            .downcast_ref::<Arc<dyn CommandHandler<C>>>()
            .map(Arc::clone)
    }
}

impl fmt::Debug for CommandBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBinding")
            .field("kind", &self.kind)
            .field("command_type", &self.command_type)
            .field("handler_type", &self.handler_type)
            .finish_non_exhaustive()
    }
}

/// A component offered to the startup scan.
///
/// Components that handle a command declare it by returning a binding;
/// everything else keeps the default and is passed over. A component can
/// declare at most one command kind.
///
/// ```
/// use std::sync::Arc;
///
/// use saga_command::{Command, CommandBinding, CommandComponent, CommandHandler};
///
/// struct CancelOrder(u64);
///
/// impl Command for CancelOrder {
///     const KIND: &'static str = "order.cancel";
///     type Output = ();
///     type Error = std::convert::Infallible;
/// }
///
/// struct CancelOrderHandler;
///
/// impl CommandHandler<CancelOrder> for CancelOrderHandler {
///     fn handle(&self, _command: CancelOrder) -> Result<(), std::convert::Infallible> {
///         Ok(())
///     }
/// }
///
/// impl CommandComponent for CancelOrderHandler {
///     fn command_binding(self: Arc<Self>) -> Option<CommandBinding> {
///         Some(CommandBinding::of::<CancelOrder, _>(self))
///     }
/// }
///
/// let binding = Arc::new(CancelOrderHandler).command_binding().expect("declares a kind");
/// assert_eq!(binding.kind().as_str(), "order.cancel");
/// ```
pub trait CommandComponent: Send + Sync + 'static {
    fn command_binding(self: Arc<Self>) -> Option<CommandBinding> {
        None
    }
}
