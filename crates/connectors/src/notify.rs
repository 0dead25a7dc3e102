//! Outbound notifications
//!
//! A [`Notification`] is a small structured message (title, fields, color,
//! timestamp). [`WebhookChannel`] posts it as a chat-style embed;
//! [`LogChannel`] only logs it and is used when no webhook is configured.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{ConnectorError, Result};

/// Embed color for urgent tickets
pub const URGENT_COLOR: u32 = 0xE74C3C;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub fields: Vec<NotificationField>,
    pub color: u32,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(title: impl Into<String>, color: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
            color,
            timestamp,
        }
    }

    pub fn field(mut self, name: &str, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(NotificationField {
            name: name.to_string(),
            value: value.into(),
            inline,
        });
        self
    }

    /// Webhook body: `{"embeds": [{title, color, timestamp, fields}]}`
    pub fn to_webhook_body(&self) -> serde_json::Value {
        json!({
            "embeds": [{
                "title": self.title,
                "color": self.color,
                "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                "fields": self.fields,
            }]
        })
    }
}

/// Destination for notifications
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Posts notifications to an incoming-webhook URL
pub struct WebhookChannel {
    client: reqwest::Client,
    url: String,
}

impl WebhookChannel {
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("deskpulse/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectorError::Init(format!("webhook HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&notification.to_webhook_body())
            .send()
            .await
            .map_err(|e| ConnectorError::Notify(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::Notify(format!(
                "webhook returned HTTP {}",
                status.as_u16()
            )));
        }

        debug!(title = %notification.title, "notification delivered");
        Ok(())
    }
}

/// Writes notifications to the log instead of delivering them
#[derive(Debug, Default)]
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let fields: Vec<String> = notification
            .fields
            .iter()
            .map(|f| format!("{}={}", f.name, f.value))
            .collect();
        info!(
            title = %notification.title,
            fields = %fields.join(", "),
            "notification (no webhook configured)"
        );
        Ok(())
    }
}
