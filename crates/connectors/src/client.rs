//! Rate-limited retrying client for the helpdesk REST API
//!
//! Every call refreshes credentials, waits for the pacer and runs through
//! [`execute_with_retry`]. Only the transport call is bounded by the
//! request timeout. The HTTP layer sits behind [`HttpTransport`] so
//! the retry behavior can be exercised without a network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::credentials::{Credentials, CredentialsProvider};
use crate::error::{ConnectorError, Result};
use crate::resilience::{
    Failure, Pacer, ResilienceConfig, ResilienceMetrics, RetryError, bounded,
    execute_with_retry, parse_retry_after,
};

const USER_AGENT: &str = "deskpulse/0.1";

/// Raw response from one GET
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Value of the `Retry-After` header, if any
    pub retry_after: Option<String>,
    pub body: String,
}

/// One authenticated GET against the helpdesk
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, credentials: &Credentials) -> Result<HttpResponse>;
}

/// `reqwest` transport using basic auth (API key as user, `X` as password)
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails (e.g., TLS misconfiguration)
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectorError::Init(format!("helpdesk HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, credentials: &Credentials) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .basic_auth(&credentials.api_key, Some("X"))
            .send()
            .await?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// Helpdesk API client with pacing, retry and 429 handling
pub struct TicketingClient {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialsProvider>,
    resilience: ResilienceConfig,
    pacer: Pacer,
    metrics: ResilienceMetrics,
}

impl TicketingClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialsProvider>,
        resilience: ResilienceConfig,
    ) -> Self {
        let pacer = Pacer::new(resilience.pace());
        Self {
            transport,
            credentials,
            resilience,
            pacer,
            metrics: ResilienceMetrics::new(),
        }
    }

    /// Client over `reqwest` with the configured timeout
    pub fn with_reqwest(
        credentials: Arc<dyn CredentialsProvider>,
        resilience: ResilienceConfig,
    ) -> Result<Self> {
        let transport = ReqwestTransport::new(resilience.timeout())?;
        Ok(Self::new(Arc::new(transport), credentials, resilience))
    }

    pub fn metrics(&self) -> &ResilienceMetrics {
        &self.metrics
    }

    /// Credentials as they are right now
    pub async fn credentials(&self) -> Result<Credentials> {
        self.credentials.current().await
    }

    /// GET `endpoint` (relative to `/api/v2/`) and parse the JSON body
    ///
    /// # Errors
    ///
    /// - `Request` once the retry budget is spent on transient failures
    /// - `RateLimited` when the server never stops answering 429
    /// - `AuthFailed` / `NotFound` / `Credentials` / `Json` immediately
    pub async fn execute(&self, endpoint: &str) -> Result<Value> {
        let result = execute_with_retry(&self.resilience, &self.metrics, endpoint, || {
            self.attempt(endpoint)
        })
        .await;

        match result {
            Ok(value) => Ok(value),
            Err(RetryError::Exhausted {
                attempts,
                last_error,
            }) => Err(ConnectorError::Request {
                endpoint: endpoint.to_string(),
                attempts,
                last_error,
            }),
            Err(RetryError::RateLimited { waits }) => Err(ConnectorError::RateLimited {
                endpoint: endpoint.to_string(),
                waits,
            }),
            Err(RetryError::Permanent(e)) => Err(e),
        }
    }

    async fn attempt(&self, endpoint: &str) -> std::result::Result<Value, Failure<ConnectorError>> {
        let credentials = self.credentials.current().await.map_err(Failure::Permanent)?;

        self.pacer.wait().await;

        let url = credentials.api_url(endpoint);
        debug!(connector = "freshdesk", endpoint = %endpoint, "GET");

        let response = bounded(
            self.resilience.timeout(),
            self.transport.get(&url, &credentials),
        )
        .await?;

        classify(endpoint, response)
    }
}

/// Map an HTTP response to a value or a failure kind
fn classify(
    endpoint: &str,
    response: HttpResponse,
) -> std::result::Result<Value, Failure<ConnectorError>> {
    match response.status {
        200..=299 => serde_json::from_str(&response.body)
            .map_err(|e| Failure::Permanent(ConnectorError::Json(e))),
        429 => Err(Failure::RateLimited {
            retry_after: parse_retry_after(response.retry_after.as_deref()),
        }),
        401 | 403 => Err(Failure::Permanent(ConnectorError::AuthFailed(format!(
            "HTTP {} for {}",
            response.status, endpoint
        )))),
        404 => Err(Failure::Permanent(ConnectorError::NotFound(
            endpoint.to_string(),
        ))),
        status => Err(Failure::Transient(ConnectorError::Status {
            status,
            body: truncate(&response.body, 200).to_string(),
        })),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
