//! Durable store configuration

use serde::Deserialize;
use std::path::PathBuf;

/// Store configuration
///
/// # Example
///
/// ```toml
/// [store]
/// path = "data/deskpulse.db"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file, created with its parent directory on first use
    pub path: PathBuf,

    /// Keep everything in memory (nothing survives a restart)
    pub memory: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/deskpulse.db"),
            memory: false,
        }
    }
}
