//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error - required field missing
    #[error("{component} '{name}' is missing required field '{field}'")]
    MissingField {
        /// Component type (e.g., "connector", "store")
        component: &'static str,
        name: String,
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("{component} '{name}' has invalid {field}: {message}")]
    InvalidValue {
        component: &'static str,
        name: String,
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Create a MissingField error
    pub fn missing_field(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
    ) -> Self {
        Self::MissingField {
            component,
            name: name.into(),
            field,
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            component,
            name: name.into(),
            field,
            message: message.into(),
        }
    }
}
