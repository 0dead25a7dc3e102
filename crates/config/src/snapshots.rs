//! Weekly snapshot job configuration

use serde::Deserialize;

/// Default weekly snapshot schedule: Mondays at 07:00 UTC
pub const DEFAULT_WEEKLY_SCHEDULE: &str = "0 0 7 * * Mon";

/// # Example
///
/// ```toml
/// [snapshots]
/// enabled = true
/// weekly_schedule = "0 0 7 * * Mon"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotsConfig {
    pub enabled: bool,

    /// Cron expression (6 fields) for the previous-week snapshot
    pub weekly_schedule: String,
}

impl Default for SnapshotsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            weekly_schedule: DEFAULT_WEEKLY_SCHEDULE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: SnapshotsConfig = toml::from_str("").unwrap();
        assert!(config.enabled);
        assert_eq!(config.weekly_schedule, DEFAULT_WEEKLY_SCHEDULE);
    }

    #[test]
    fn test_disabled() {
        let config: SnapshotsConfig = toml::from_str("enabled = false").unwrap();
        assert!(!config.enabled);
    }
}
