//! DeskPulse Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use deskpulse_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[store]\nmemory = true").unwrap();
//! assert!(config.store.memory);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [store]
//! path = "data/deskpulse.db"
//!
//! [notify]
//! webhook_url = "https://chat.example.com/hooks/abc"
//!
//! [connectors.helpdesk]
//! type = "freshdesk"
//! domain = "acme.freshdesk.com"
//! api_key = "xxx"
//!
//! [snapshots]
//! weekly_schedule = "0 0 7 * * Mon"
//! ```

mod connectors;
mod error;
mod logging;
mod notify;
mod snapshots;
mod store;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use connectors::{
    ConnectorsConfig, DEFAULT_SYNC_SCHEDULE, KNOWN_CONNECTOR_TYPES, RawConnectorConfig,
    is_known_connector_type,
};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use notify::NotifyConfig;
pub use snapshots::{DEFAULT_WEEKLY_SCHEDULE, SnapshotsConfig};
pub use store::StoreConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,

    /// Snapshot, ticket and watermark storage
    pub store: StoreConfig,

    /// Urgent-ticket notification channel
    pub notify: NotifyConfig,

    /// Helpdesk connectors
    pub connectors: ConnectorsConfig,

    /// Weekly snapshot job
    pub snapshots: SnapshotsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or contains invalid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.log.level, LogLevel::Info);
        assert!(config.connectors.is_empty());
        assert!(config.snapshots.enabled);
        assert!(config.notify.webhook_url.is_none());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[log]
level = "debug"
format = "json"

[store]
path = "/var/lib/deskpulse/db"

[notify]
webhook_url = "https://chat.example.com/hooks/abc"

[connectors.helpdesk]
type = "freshdesk"
schedule = "0 */15 * * * *"
domain = "acme.freshdesk.com"
api_key = "k"

[connectors.helpdesk.monitor]
interval_secs = 30

[snapshots]
weekly_schedule = "0 30 7 * * Mon"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.store.path, Path::new("/var/lib/deskpulse/db"));
        assert_eq!(config.connectors.len(), 1);
        let helpdesk = config.connectors.get("helpdesk").unwrap();
        assert_eq!(helpdesk.schedule, "0 */15 * * * *");
        assert_eq!(config.snapshots.weekly_schedule, "0 30 7 * * Mon");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nmemory = true").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(config.store.memory);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/deskpulse.toml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
