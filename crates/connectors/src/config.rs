//! Connector configuration types
//!
//! Configs are parsed from raw TOML values provided by the config crate.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::credentials::{
    Credentials, CredentialsProvider, FallbackCredentials, FileCredentials, StaticCredentials,
};
use crate::dedup::DEFAULT_NOTIFIED_BOUND;
use crate::error::ConnectorError;
use crate::resilience::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_RATE_LIMIT_WAITS, DEFAULT_PACE_MS,
    DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_TIMEOUT_SECS, ResilienceConfig,
};

/// Freshdesk connector configuration
///
/// # Example
///
/// ```toml
/// [connectors.helpdesk]
/// type = "freshdesk"
/// schedule = "0 0 6 * * Mon"      # incremental sync (6-field cron)
/// domain = "acme.freshdesk.com"
/// api_key = "xxx"
/// credentials_file = "/etc/deskpulse/freshdesk.toml"  # optional, re-read per call
/// pace_ms = 1000
/// max_attempts = 3
///
/// [connectors.helpdesk.monitor]
/// enabled = true
/// interval_secs = 60
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FreshdeskConnectorConfig {
    /// Helpdesk domain, e.g. `acme.freshdesk.com`
    pub domain: String,

    /// API key used when no credentials file is readable
    pub api_key: Option<String>,

    /// TOML file with `domain` and `api_key`, read before every call
    pub credentials_file: Option<PathBuf>,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Attempts for transient failures (default: 3)
    pub max_attempts: u32,

    /// Linear backoff base (default: 1000)
    pub retry_base_delay_ms: u64,

    /// Minimum gap between calls (default: 1000)
    pub pace_ms: u64,

    /// 429 waits tolerated per call (default: 20)
    pub max_rate_limit_waits: u32,

    /// Extra delay between pages during bulk reload (default: 250)
    pub bulk_page_delay_ms: u64,

    /// Extra delay between pages during incremental sync (default: 1000)
    pub incremental_page_delay_ms: u64,

    /// Group/company label TTL (default: 3600)
    pub label_ttl_secs: u64,

    pub monitor: MonitorConfig,
}

impl Default for FreshdeskConnectorConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            api_key: None,
            credentials_file: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            pace_ms: DEFAULT_PACE_MS,
            max_rate_limit_waits: DEFAULT_MAX_RATE_LIMIT_WAITS,
            bulk_page_delay_ms: 250,
            incremental_page_delay_ms: 1000,
            label_ttl_secs: 3600,
            monitor: MonitorConfig::default(),
        }
    }
}

/// Urgent ticket monitor settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub enabled: bool,
    /// Poll interval (default: 60)
    pub interval_secs: u64,
    /// Trailing creation window searched each poll (default: 24)
    pub window_hours: u64,
    /// Notified ids retained for dedup (default: 1000)
    pub max_notified: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            window_hours: 24,
            max_notified: DEFAULT_NOTIFIED_BOUND,
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.window_hours as i64)
    }
}

impl FreshdeskConnectorConfig {
    /// Parse config from raw TOML value
    pub fn from_toml(value: &toml::Value) -> Result<Self, ConnectorError> {
        let config: FreshdeskConnectorConfig =
            value.clone().try_into().map_err(|e: toml::de::Error| {
                ConnectorError::Config(format!("Invalid Freshdesk config: {}", e))
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<(), ConnectorError> {
        if self.credentials_file.is_none() {
            if self.domain.trim().is_empty() {
                return Err(ConnectorError::Config(
                    "domain is required without credentials_file".into(),
                ));
            }
            if self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
                return Err(ConnectorError::Config(
                    "api_key is required without credentials_file".into(),
                ));
            }
        }
        if self.max_attempts == 0 {
            return Err(ConnectorError::Config("max_attempts must be at least 1".into()));
        }
        if self.monitor.interval_secs == 0 {
            return Err(ConnectorError::Config(
                "monitor.interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Build resilience config from these settings
    pub fn resilience_config(&self) -> ResilienceConfig {
        ResilienceConfig {
            timeout_secs: self.timeout_secs,
            max_attempts: self.max_attempts,
            retry_base_delay_ms: self.retry_base_delay_ms,
            pace_ms: self.pace_ms,
            max_rate_limit_waits: self.max_rate_limit_waits,
        }
    }

    /// Credentials provider: the file when configured, static config behind it
    pub fn credentials_provider(&self) -> Arc<dyn CredentialsProvider> {
        let fallback = StaticCredentials::new(Credentials::new(
            self.domain.clone(),
            self.api_key.clone().unwrap_or_default(),
        ));
        match &self.credentials_file {
            Some(path) => Arc::new(FallbackCredentials::new(
                Arc::new(FileCredentials::new(path.clone())),
                fallback,
            )),
            None => Arc::new(fallback),
        }
    }

    pub fn bulk_page_delay(&self) -> Duration {
        Duration::from_millis(self.bulk_page_delay_ms)
    }

    pub fn incremental_page_delay(&self) -> Duration {
        Duration::from_millis(self.incremental_page_delay_ms)
    }

    pub fn label_ttl(&self) -> Duration {
        Duration::from_secs(self.label_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<FreshdeskConnectorConfig, ConnectorError> {
        let value: toml::Value = toml::from_str(s).unwrap();
        FreshdeskConnectorConfig::from_toml(&value)
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse("domain = \"acme.freshdesk.com\"\napi_key = \"k\"").unwrap();
        assert_eq!(config.resilience_config(), ResilienceConfig::default());
        assert_eq!(config.monitor, MonitorConfig::default());
        assert!(config.incremental_page_delay() > config.bulk_page_delay());
        assert_eq!(config.label_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_overrides() {
        let config = parse(
            r#"
            domain = "acme.freshdesk.com"
            api_key = "k"
            pace_ms = 250
            max_attempts = 5

            [monitor]
            enabled = false
            interval_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.pace_ms, 250);
        assert_eq!(config.resilience_config().max_attempts, 5);
        assert!(!config.monitor.enabled);
        assert_eq!(config.monitor.interval(), Duration::from_secs(30));
        assert_eq!(config.monitor.window_hours, 24);
    }

    #[test]
    fn test_missing_key_rejected() {
        assert!(matches!(
            parse("domain = \"acme.freshdesk.com\""),
            Err(ConnectorError::Config(_))
        ));
    }

    #[test]
    fn test_credentials_file_makes_static_optional() {
        let config = parse("credentials_file = \"/etc/deskpulse/fd.toml\"").unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_unknown_type_field_ignored() {
        // The config crate passes the whole table, including `type`
        let config = parse(
            "type = \"freshdesk\"\nschedule = \"0 0 6 * * Mon\"\ndomain = \"a\"\napi_key = \"k\"",
        );
        assert!(config.is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert!(parse("domain = \"a\"\napi_key = \"k\"\nmax_attempts = 0").is_err());
    }
}
