//! In-test fakes for the transport and notification seams

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::client::{HttpResponse, HttpTransport, TicketingClient};
use crate::credentials::{Credentials, StaticCredentials};
use crate::error::{ConnectorError, Result};
use crate::notify::{Notification, NotificationChannel};
use crate::resilience::ResilienceConfig;

type Handler = dyn Fn(&str) -> Result<HttpResponse> + Send + Sync;

/// Transport answering every GET through a closure and recording URLs
/// and the API key each request was sent with
pub struct TestTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<String>>,
    api_keys: Mutex<Vec<String>>,
}

impl TestTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            api_keys: Mutex::new(Vec::new()),
        }
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// API keys used so far, in request order
    pub fn api_keys(&self) -> Vec<String> {
        self.api_keys.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for TestTransport {
    async fn get(&self, url: &str, credentials: &Credentials) -> Result<HttpResponse> {
        self.requests.lock().push(url.to_string());
        self.api_keys.lock().push(credentials.api_key.clone());
        (self.handler)(url)
    }
}

/// 200 response with a JSON body
pub fn ok_json(body: Value) -> Result<HttpResponse> {
    Ok(status(200, &body.to_string()))
}

pub fn status(code: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status: code,
        retry_after: None,
        body: body.to_string(),
    }
}

/// Value of a query parameter in `url`
pub fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    let query = url.split_once('?')?.1;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Page number requested by `url`, defaulting to 1
pub fn page_of(url: &str) -> u32 {
    query_param(url, "page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1)
}

/// Resilience settings with no pacing and short backoff
pub fn fast_resilience() -> ResilienceConfig {
    ResilienceConfig {
        pace_ms: 0,
        retry_base_delay_ms: 10,
        ..Default::default()
    }
}

/// Client over `transport` with static test credentials
pub fn test_client(transport: Arc<TestTransport>, resilience: ResilienceConfig) -> TicketingClient {
    TicketingClient::new(
        transport,
        Arc::new(StaticCredentials::new(Credentials::new(
            "acme.freshdesk.com",
            "test-key",
        ))),
        resilience,
    )
}

/// Notification channel that records messages and can be told to fail
#[derive(Default)]
pub struct TestChannel {
    sent: Mutex<Vec<Notification>>,
    failing: Mutex<bool>,
}

impl TestChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl NotificationChannel for TestChannel {
    async fn send(&self, notification: &Notification) -> Result<()> {
        if *self.failing.lock() {
            return Err(ConnectorError::Notify("channel down".into()));
        }
        self.sent.lock().push(notification.clone());
        Ok(())
    }
}
