use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use vault_records::JournalSync;

use crate::error::ConfigError;
use crate::wait::WaitPolicy;

/// Orchestrator configuration.
///
/// ```toml
/// poll_interval_ms = 5000        # 0 disables the background loop
/// journal_path = "vault.journal" # omit to keep records in memory
/// journal_sync = "os-default"    # or "every-write"
///
/// [wait]
/// initial_ms = 1000
/// factor = 2
/// cap_units = 120
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Interval of the background reconciliation loop in milliseconds.
    pub poll_interval_ms: u64,
    pub journal_path: Option<PathBuf>,
    pub journal_sync: JournalSync,
    pub wait: WaitPolicy,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5000,
            journal_path: None,
            journal_sync: JournalSync::default(),
            wait: WaitPolicy::default(),
        }
    }
}

impl ArchiveConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.wait.validate()
    }

    /// The background loop interval, or `None` if the loop is disabled.
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_ms > 0).then(|| Duration::from_millis(self.poll_interval_ms))
    }
}
