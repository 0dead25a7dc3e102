//! Sync strategies
//!
//! - **Bulk reload**: every ticket updated since the start of the year,
//!   always a full walk, no watermark.
//! - **Incremental sync**: tickets updated since the watermark, with a
//!   slower page delay since it runs often against a shared API.
//!
//! Strategies only fetch. [`SyncRunner`] persists the result and advances
//! the watermark, and allows a single run at a time. Each runner owns one
//! connector's tickets and watermark in the shared stores.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deskpulse_analytics::start_of_year;
use deskpulse_control::{TicketStore, WatermarkStore};
use deskpulse_protocol::TicketRecord;
use serde::Serialize;
use tracing::{info, warn};

use crate::client::TicketingClient;
use crate::error::{ConnectorError, Result};
use crate::pagination::fetch_tickets_updated_since;
use crate::scheduler::Job;

/// Watermark key for ticket sync of one connector
pub fn tickets_watermark(source: &str) -> String {
    format!("tickets:{}", source)
}

/// Full year-to-date ticket fetch
pub struct BulkReload {
    client: Arc<TicketingClient>,
    page_delay: Duration,
}

impl BulkReload {
    pub fn new(client: Arc<TicketingClient>, page_delay: Duration) -> Self {
        Self { client, page_delay }
    }

    /// Every ticket updated since January 1st of `now`'s year
    pub async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<TicketRecord>> {
        fetch_tickets_updated_since(&self.client, start_of_year(now), self.page_delay).await
    }
}

/// Watermark-driven ticket fetch
pub struct IncrementalSync {
    client: Arc<TicketingClient>,
    page_delay: Duration,
}

impl IncrementalSync {
    pub fn new(client: Arc<TicketingClient>, page_delay: Duration) -> Self {
        Self { client, page_delay }
    }

    /// Tickets with `updated_at >= since`
    pub async fn fetch(&self, since: DateTime<Utc>) -> Result<Vec<TicketRecord>> {
        fetch_tickets_updated_since(&self.client, since, self.page_delay).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Bulk,
    Incremental,
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncMode::Bulk => write!(f, "bulk"),
            SyncMode::Incremental => write!(f, "incremental"),
        }
    }
}

/// Outcome of a completed sync run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub mode: SyncMode,
    pub started_at: DateTime<Utc>,
    /// Lower bound used for the fetch
    pub since: DateTime<Utc>,
    pub tickets: usize,
    /// Watermark after the run (incremental only)
    pub watermark: Option<DateTime<Utc>>,
}

/// Runs strategies against the stores, one run at a time
pub struct SyncRunner {
    source: String,
    watermark_key: String,
    bulk: BulkReload,
    incremental: IncrementalSync,
    tickets: Arc<dyn TicketStore>,
    watermarks: Arc<dyn WatermarkStore>,
    running: AtomicBool,
}

/// Clears the run flag when a run ends, however it ends
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncRunner {
    /// Runner for the connector named `source`
    pub fn new(
        source: impl Into<String>,
        bulk: BulkReload,
        incremental: IncrementalSync,
        tickets: Arc<dyn TicketStore>,
        watermarks: Arc<dyn WatermarkStore>,
    ) -> Self {
        let source = source.into();
        Self {
            watermark_key: tickets_watermark(&source),
            source,
            bulk,
            incremental,
            tickets,
            watermarks,
            running: AtomicBool::new(false),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn watermark_key(&self) -> &str {
        &self.watermark_key
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn try_start(&self) -> Result<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| RunGuard(&self.running))
            .map_err(|_| ConnectorError::SyncInProgress)
    }

    /// Fetch everything since the start of the year and replace the table
    pub async fn run_bulk(&self) -> Result<SyncReport> {
        self.run_bulk_at(Utc::now()).await
    }

    pub async fn run_bulk_at(&self, now: DateTime<Utc>) -> Result<SyncReport> {
        let _guard = self.try_start()?;
        let source = self.source.as_str();
        info!(connector = source, mode = %SyncMode::Bulk, "sync started");

        let tickets = self.bulk.fetch(now).await.inspect_err(|e| {
            warn!(
                connector = source,
                mode = %SyncMode::Bulk,
                error = %e,
                "sync fetch failed, store untouched"
            );
        })?;
        self.tickets.replace_all(source, &tickets).await?;

        info!(
            connector = source,
            mode = %SyncMode::Bulk,
            tickets = tickets.len(),
            "sync complete"
        );
        Ok(SyncReport {
            mode: SyncMode::Bulk,
            started_at: now,
            since: start_of_year(now),
            tickets: tickets.len(),
            watermark: None,
        })
    }

    /// Fetch tickets changed since the watermark, upsert, advance
    pub async fn run_incremental(&self) -> Result<SyncReport> {
        self.run_incremental_at(Utc::now()).await
    }

    /// Incremental run that started at `started_at`
    ///
    /// The watermark moves to `started_at` only after the upsert succeeds,
    /// never to the newest `updated_at` seen.
    pub async fn run_incremental_at(&self, started_at: DateTime<Utc>) -> Result<SyncReport> {
        let _guard = self.try_start()?;
        let source = self.source.as_str();

        let since = self
            .watermarks
            .get(&self.watermark_key)
            .await?
            .unwrap_or_else(|| start_of_year(started_at));
        info!(
            connector = source,
            mode = %SyncMode::Incremental,
            since = %since,
            "sync started"
        );

        let tickets = self.incremental.fetch(since).await.inspect_err(|e| {
            warn!(
                connector = source,
                mode = %SyncMode::Incremental,
                error = %e,
                "sync fetch failed, watermark kept"
            );
        })?;
        self.tickets.upsert_many(source, &tickets).await?;
        self.watermarks.advance(&self.watermark_key, started_at).await?;

        let watermark = self.watermarks.get(&self.watermark_key).await?;
        info!(
            connector = source,
            mode = %SyncMode::Incremental,
            tickets = tickets.len(),
            watermark = ?watermark,
            "sync complete"
        );
        Ok(SyncReport {
            mode: SyncMode::Incremental,
            started_at,
            since,
            tickets: tickets.len(),
            watermark,
        })
    }
}

/// Scheduled sync in one mode
pub struct SyncJob {
    runner: Arc<SyncRunner>,
    mode: SyncMode,
}

impl SyncJob {
    pub fn new(runner: Arc<SyncRunner>, mode: SyncMode) -> Self {
        Self { runner, mode }
    }
}

#[async_trait]
impl Job for SyncJob {
    async fn run(&self) -> Result<()> {
        match self.mode {
            SyncMode::Bulk => self.runner.run_bulk().await?,
            SyncMode::Incremental => self.runner.run_incremental().await?,
        };
        Ok(())
    }
}
