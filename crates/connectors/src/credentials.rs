//! Helpdesk credentials
//!
//! The client asks its provider for credentials before every call, so a
//! rotated API key or a domain change is picked up without a restart.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ConnectorError, Result};

/// Domain and API key for one helpdesk account
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub domain: String,
    pub api_key: String,
}

impl Credentials {
    pub fn new(domain: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            api_key: api_key.into(),
        }
    }

    /// Scheme and host, e.g. `https://acme.freshdesk.com`
    ///
    /// A domain that already carries a scheme is used verbatim.
    pub fn base_url(&self) -> String {
        let domain = self.domain.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{}", domain)
        }
    }

    /// Full API URL for `endpoint` (relative to `/api/v2/`)
    pub fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/v2/{}", self.base_url(), endpoint.trim_start_matches('/'))
    }

    /// Agent-facing link to a ticket
    pub fn ticket_link(&self, ticket_id: u64) -> String {
        format!("{}/a/tickets/{}", self.base_url(), ticket_id)
    }

    fn validate(self) -> Result<Self> {
        if self.domain.trim().is_empty() {
            return Err(ConnectorError::Credentials("domain is empty".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConnectorError::Credentials("api_key is empty".into()));
        }
        Ok(self)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("domain", &self.domain)
            .field("api_key", &"***")
            .finish()
    }
}

/// Source of the current credentials
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn current(&self) -> Result<Credentials>;
}

/// Fixed credentials from configuration
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentials {
    async fn current(&self) -> Result<Credentials> {
        self.credentials.clone().validate()
    }
}

/// Credentials re-read from a TOML file on every call
///
/// ```toml
/// domain = "acme.freshdesk.com"
/// api_key = "..."
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialsProvider for FileCredentials {
    async fn current(&self) -> Result<Credentials> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ConnectorError::Credentials(format!("{}: {}", self.path.display(), e))
        })?;
        let credentials: Credentials = toml::from_str(&content).map_err(|e| {
            ConnectorError::Credentials(format!("{}: {}", self.path.display(), e))
        })?;
        credentials.validate()
    }
}

/// Dynamic provider first, static configuration when it fails
pub struct FallbackCredentials {
    primary: Arc<dyn CredentialsProvider>,
    fallback: StaticCredentials,
}

impl FallbackCredentials {
    pub fn new(primary: Arc<dyn CredentialsProvider>, fallback: StaticCredentials) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl CredentialsProvider for FallbackCredentials {
    async fn current(&self) -> Result<Credentials> {
        match self.primary.current().await {
            Ok(credentials) => Ok(credentials),
            Err(e) => {
                debug!(error = %e, "dynamic credentials unavailable, using static config");
                self.fallback.current().await
            }
        }
    }
}
