use saga_command::{DispatchError, RegistryError};
use saga_config::ConfigError;
use thiserror::Error;

use crate::order::PlaceOrderError;

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("configuration error")]
    Config(#[from] ConfigError),

    #[error("{0} pattern is disabled in configuration")]
    PatternDisabled(&'static str),

    #[error("failed to start async runtime")]
    Runtime(#[source] std::io::Error),

    #[error("command registry error")]
    Registry(#[from] RegistryError),

    #[error("failed to place order")]
    Dispatch(#[from] DispatchError<PlaceOrderError>),
}

pub(crate) type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use saga_command::CommandKind;

    use super::*;

    #[test]
    fn disabled_pattern_names_the_pattern() {
        let err = CliError::PatternDisabled("cqrs");

        assert_eq!(err.to_string(), "cqrs pattern is disabled in configuration");
    }

    #[test]
    fn dispatch_error_converts_via_from() {
        let dispatch: DispatchError<PlaceOrderError> = DispatchError::HandlerNotFound {
            kind: CommandKind::new("order.place"),
        };

        let err: CliError = dispatch.into();

        assert!(matches!(err, CliError::Dispatch(_)));
        assert!(
            err.source()
                .is_some_and(|cause| cause.to_string().contains("order.place"))
        );
    }
}
