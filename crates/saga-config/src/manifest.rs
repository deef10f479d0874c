use saga_core::{CancellationPolicy, DuplicatePolicy};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub(crate) struct ConfigFile {
    #[serde(default)]
    pub(crate) pattern: PatternSection,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct PatternSection {
    pub(crate) saga: Option<SagaSection>,
    pub(crate) cqrs: Option<CqrsSection>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct SagaSection {
    pub(crate) enabled: Option<bool>,
    #[serde(rename = "default-timeout-secs")]
    pub(crate) default_timeout_secs: Option<u64>,
    pub(crate) cancellation: Option<CancellationPolicy>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct CqrsSection {
    pub(crate) enabled: Option<bool>,
    #[serde(rename = "duplicate-commands")]
    pub(crate) duplicate_commands: Option<DuplicatePolicy>,
}
