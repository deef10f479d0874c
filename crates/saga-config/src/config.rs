use std::fs;
use std::path::Path;
use std::time::Duration;

use saga_core::{CancellationPolicy, DuplicatePolicy};
use saga_orchestrator::OrchestratorConfig;

use crate::error::ConfigError;
use crate::manifest::{ConfigFile, CqrsSection, SagaSection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaSettings {
    enabled: bool,
    default_timeout: Duration,
    cancellation: CancellationPolicy,
}

impl Default for SagaSettings {
    fn default() -> Self {
        let orchestrator = OrchestratorConfig::default();
        Self {
            enabled: true,
            default_timeout: orchestrator.default_timeout(),
            cancellation: orchestrator.cancellation_policy(),
        }
    }
}

impl SagaSettings {
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    #[must_use]
    pub fn cancellation(&self) -> CancellationPolicy {
        self.cancellation
    }

    #[must_use]
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::new(self.default_timeout, self.cancellation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CqrsSettings {
    enabled: bool,
    duplicate_commands: DuplicatePolicy,
}

impl Default for CqrsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            duplicate_commands: DuplicatePolicy::default(),
        }
    }
}

impl CqrsSettings {
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn duplicate_commands(&self) -> DuplicatePolicy {
        self.duplicate_commands
    }
}

/// Validated `[pattern]` configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternConfig {
    saga: SagaSettings,
    cqrs: CqrsSettings,
}

impl PatternConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML, has values of the
    /// wrong type, or sets a zero timeout.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Self::from_file(file)
    }

    /// Reads and parses the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a value
    /// is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&content).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_file(file)
    }

    #[must_use]
    pub fn saga(&self) -> &SagaSettings {
        &self.saga
    }

    #[must_use]
    pub fn cqrs(&self) -> &CqrsSettings {
        &self.cqrs
    }

    fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        Ok(Self {
            saga: build_saga_settings(file.pattern.saga.unwrap_or_default())?,
            cqrs: build_cqrs_settings(file.pattern.cqrs.unwrap_or_default()),
        })
    }
}

fn build_saga_settings(section: SagaSection) -> Result<SagaSettings, ConfigError> {
    let defaults = SagaSettings::default();
    let default_timeout = match section.default_timeout_secs {
        None => defaults.default_timeout,
        Some(0) => {
            return Err(ConfigError::InvalidValue {
                key: "pattern.saga.default-timeout-secs",
                value: "0".to_string(),
                reason: "timeout must be at least one second",
            });
        }
        Some(secs) => Duration::from_secs(secs),
    };

    Ok(SagaSettings {
        enabled: section.enabled.unwrap_or(defaults.enabled),
        default_timeout,
        cancellation: section.cancellation.unwrap_or(defaults.cancellation),
    })
}

fn build_cqrs_settings(section: CqrsSection) -> CqrsSettings {
    let defaults = CqrsSettings::default();
    CqrsSettings {
        enabled: section.enabled.unwrap_or(defaults.enabled),
        duplicate_commands: section
            .duplicate_commands
            .unwrap_or(defaults.duplicate_commands),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() -> anyhow::Result<()> {
        let config = PatternConfig::from_toml_str("")?;

        assert_eq!(config, PatternConfig::default());
        assert!(config.saga().enabled());
        assert_eq!(config.saga().default_timeout(), Duration::from_secs(30));
        assert_eq!(
            config.saga().cancellation(),
            CancellationPolicy::CompensateAndStop
        );
        assert!(config.cqrs().enabled());
        assert_eq!(config.cqrs().duplicate_commands(), DuplicatePolicy::LastWins);
        Ok(())
    }

    #[test]
    fn parses_every_key() -> anyhow::Result<()> {
        let toml = r#"
[pattern.saga]
enabled = false
default-timeout-secs = 5
cancellation = "compensate-and-continue"

[pattern.cqrs]
enabled = false
duplicate-commands = "reject"
"#;

        let config = PatternConfig::from_toml_str(toml)?;

        assert!(!config.saga().enabled());
        assert_eq!(config.saga().default_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.saga().cancellation(),
            CancellationPolicy::CompensateAndContinue
        );
        assert!(!config.cqrs().enabled());
        assert_eq!(config.cqrs().duplicate_commands(), DuplicatePolicy::Reject);
        Ok(())
    }

    #[test]
    fn partial_section_keeps_other_defaults() -> anyhow::Result<()> {
        let toml = r"
[pattern.saga]
default-timeout-secs = 90
";

        let config = PatternConfig::from_toml_str(toml)?;

        assert!(config.saga().enabled());
        assert_eq!(config.saga().default_timeout(), Duration::from_secs(90));
        assert_eq!(config.cqrs(), &CqrsSettings::default());
        Ok(())
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let toml = r"
[pattern.saga]
default-timeout-secs = 0
";

        let result = PatternConfig::from_toml_str(toml);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key, .. }) if key == "pattern.saga.default-timeout-secs"
        ));
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let toml = r#"
[pattern.cqrs]
duplicate-commands = "first-wins"
"#;

        let result = PatternConfig::from_toml_str(toml);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn unrelated_tables_are_ignored() -> anyhow::Result<()> {
        let toml = r#"
[server]
port = 8080

[pattern.saga]
enabled = true
"#;

        let config = PatternConfig::from_toml_str(toml)?;

        assert!(config.saga().enabled());
        Ok(())
    }

    #[test]
    fn default_saga_settings_match_orchestrator_defaults() {
        let settings = SagaSettings::default();

        assert_eq!(
            settings.default_timeout(),
            saga_orchestrator::DEFAULT_TIMEOUT
        );
        assert_eq!(settings.orchestrator_config(), OrchestratorConfig::default());
    }

    #[test]
    fn saga_settings_convert_to_orchestrator_config() {
        let settings = SagaSettings {
            enabled: true,
            default_timeout: Duration::from_secs(12),
            cancellation: CancellationPolicy::CompensateAndContinue,
        };

        let config = settings.orchestrator_config();

        assert_eq!(config.default_timeout(), Duration::from_secs(12));
        assert_eq!(
            config.cancellation_policy(),
            CancellationPolicy::CompensateAndContinue
        );
    }
}
