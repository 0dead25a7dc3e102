//! Protocol error types

use thiserror::Error;

/// Errors raised while interpreting shared model values
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Snapshot category string not recognised
    #[error("unknown snapshot category: {0}")]
    UnknownCategory(String),

    /// Snapshot payload has the wrong shape
    #[error("invalid snapshot payload: {0}")]
    InvalidPayload(String),
}
