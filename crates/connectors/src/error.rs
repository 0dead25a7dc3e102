//! Error types for connectors

use deskpulse_control::ControlError;
use thiserror::Error;

/// Errors that can occur during connector operations
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Failed to initialize connector (e.g., HTTP client creation failed)
    #[error("failed to initialize connector: {0}")]
    Init(String),

    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected HTTP status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Retry budget exhausted
    #[error("request to {endpoint} failed after {attempts} attempts: {last_error}")]
    Request {
        endpoint: String,
        attempts: u32,
        last_error: String,
    },

    /// The server kept answering 429
    #[error("rate limited on {endpoint} after {waits} waits")]
    RateLimited { endpoint: String, waits: u32 },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Pagination could not make progress
    #[error("pagination error: {0}")]
    Pagination(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schedule parsing error
    #[error("Invalid cron schedule: {0}")]
    InvalidSchedule(String),

    /// Credentials could not be loaded
    #[error("credentials unavailable: {0}")]
    Credentials(String),

    /// Notification delivery failed
    #[error("notification failed: {0}")]
    Notify(String),

    /// Durable store failure
    #[error("store error: {0}")]
    Store(#[from] ControlError),

    /// A sync run is already in flight
    #[error("a sync run is already in progress")]
    SyncInProgress,
}

/// Result type for connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;
