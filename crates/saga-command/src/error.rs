use thiserror::Error;

use crate::command::CommandKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error(
        "command kind '{kind}' is already handled by {existing}, refusing second handler {rejected}"
    )]
    DuplicateKind {
        kind: CommandKind,
        existing: &'static str,
        rejected: &'static str,
    },
}

/// Error from [`CommandRegistry::dispatch`](crate::CommandRegistry::dispatch).
#[derive(Debug, Error)]
pub enum DispatchError<E> {
    #[error("no handler registered for command kind '{kind}'")]
    HandlerNotFound { kind: CommandKind },

    #[error("handler for command kind '{kind}' failed")]
    Handler {
        kind: CommandKind,
        #[source]
        source: E,
    },
}

impl<E> DispatchError<E> {
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::HandlerNotFound { kind } | Self::Handler { kind, .. } => *kind,
        }
    }

    /// The handler's own error, if the handler ran and failed.
    pub fn into_handler_error(self) -> Option<E> {
        match self {
            Self::Handler { source, .. } => Some(source),
            Self::HandlerNotFound { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Error)]
    #[error("insufficient funds")]
    struct Declined;

    #[test]
    fn duplicate_kind_names_both_handlers() {
        let err = RegistryError::DuplicateKind {
            kind: CommandKind::new("order.place"),
            existing: "FirstHandler",
            rejected: "SecondHandler",
        };

        let message = err.to_string();
        assert!(message.contains("'order.place'"));
        assert!(message.contains("FirstHandler"));
        assert!(message.contains("SecondHandler"));
    }

    #[test]
    fn handler_error_is_kept_as_source() {
        let err = DispatchError::Handler {
            kind: CommandKind::new("payment.charge"),
            source: Declined,
        };

        assert_eq!(
            std::error::Error::source(&err).map(ToString::to_string),
            Some("insufficient funds".to_string())
        );
        assert_eq!(err.kind().as_str(), "payment.charge");
        assert_eq!(err.into_handler_error(), Some(Declined));
    }

    #[test]
    fn not_found_has_no_handler_error() {
        let err: DispatchError<Declined> = DispatchError::HandlerNotFound {
            kind: CommandKind::new("payment.refund"),
        };

        assert_eq!(
            err.to_string(),
            "no handler registered for command kind 'payment.refund'"
        );
        assert!(err.into_handler_error().is_none());
    }
}
