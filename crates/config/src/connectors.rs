//! Connector configuration types
//!
//! Generic configuration for helpdesk connectors. Connector-specific
//! settings stay raw here and are parsed by the connectors crate.
//!
//! # Example
//!
//! ```toml
//! [connectors.helpdesk]
//! type = "freshdesk"
//! schedule = "0 0 6 * * Mon"
//! domain = "acme.freshdesk.com"
//! api_key = "xxx"
//!
//! [connectors.helpdesk.monitor]
//! interval_secs = 60
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;

/// Connector types this build knows how to run
pub const KNOWN_CONNECTOR_TYPES: &[&str] = &["freshdesk"];

/// Default sync schedule: Mondays at 06:00 UTC
pub const DEFAULT_SYNC_SCHEDULE: &str = "0 0 6 * * Mon";

/// Check if a connector type is known
pub fn is_known_connector_type(connector_type: &str) -> bool {
    KNOWN_CONNECTOR_TYPES.contains(&connector_type)
}

/// Named connector instances, ordered by name
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectorsConfig {
    #[serde(flatten)]
    connectors: BTreeMap<String, RawConnectorConfig>,
}

impl ConnectorsConfig {
    pub fn get(&self, name: &str) -> Option<&RawConnectorConfig> {
        self.connectors.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawConnectorConfig)> {
        self.connectors.iter()
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    /// Enabled connectors of one type
    pub fn enabled_by_type(
        &self,
        connector_type: &str,
    ) -> impl Iterator<Item = (&String, &RawConnectorConfig)> {
        self.connectors
            .iter()
            .filter(move |(_, c)| c.enabled && c.connector_type == connector_type)
    }
}

/// Raw connector configuration
///
/// `config` holds every key besides `type`, `enabled` and `schedule`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConnectorConfig {
    #[serde(rename = "type")]
    pub connector_type: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Incremental sync cron expression (6 fields)
    #[serde(default = "default_schedule")]
    pub schedule: String,

    #[serde(flatten)]
    pub config: toml::Value,
}

fn default_enabled() -> bool {
    true
}

fn default_schedule() -> String {
    DEFAULT_SYNC_SCHEDULE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_connectors() {
        let config: ConnectorsConfig = toml::from_str("").unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_single_connector() {
        let toml = r#"
[helpdesk]
type = "freshdesk"
domain = "acme.freshdesk.com"
api_key = "k"
"#;
        let config: ConnectorsConfig = toml::from_str(toml).unwrap();
        let connector = config.get("helpdesk").unwrap();

        assert_eq!(connector.connector_type, "freshdesk");
        assert!(connector.enabled);
        assert_eq!(connector.schedule, DEFAULT_SYNC_SCHEDULE);
        assert_eq!(
            connector.config.get("domain").and_then(|v| v.as_str()),
            Some("acme.freshdesk.com")
        );
        assert!(connector.config.get("type").is_none());
    }

    #[test]
    fn test_nested_monitor_table_kept_raw() {
        let toml = r#"
[helpdesk]
type = "freshdesk"

[helpdesk.monitor]
interval_secs = 30
"#;
        let config: ConnectorsConfig = toml::from_str(toml).unwrap();
        let raw = &config.get("helpdesk").unwrap().config;
        assert!(raw.get("monitor").is_some_and(|m| m.is_table()));
    }

    #[test]
    fn test_enabled_by_type() {
        let toml = r#"
[a]
type = "freshdesk"

[b]
type = "freshdesk"
enabled = false

[c]
type = "zendesk"
"#;
        let config: ConnectorsConfig = toml::from_str(toml).unwrap();
        let names: Vec<_> = config.enabled_by_type("freshdesk").map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_known_types() {
        assert!(is_known_connector_type("freshdesk"));
        assert!(!is_known_connector_type("github"));
    }
}
