//! Notification channel configuration

use serde::Deserialize;
use std::time::Duration;

/// Where urgent-ticket notifications go
///
/// Without `webhook_url`, notifications are written to the log.
///
/// # Example
///
/// ```toml
/// [notify]
/// webhook_url = "https://chat.example.com/hooks/abc"
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,

    /// Webhook request timeout (default: 10)
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 10,
        }
    }
}

impl NotifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
