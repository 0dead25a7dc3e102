//! Analytics error types

use thiserror::Error;

/// Analytics errors
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Invalid time range
    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),

    /// Input rejected by a validator
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for analytics operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;
