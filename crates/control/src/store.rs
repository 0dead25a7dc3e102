//! Store seams
//!
//! The pipeline only needs point lookups, insert-or-replace and a
//! full-table reload. Both [`crate::MemoryStore`] and
//! [`crate::ControlPlane`] implement every trait here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deskpulse_protocol::{Snapshot, TicketRecord};
use tracing::debug;

use crate::error::Result;

/// Key-addressable snapshot storage
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Look up a snapshot by id
    async fn get(&self, snapshot_id: &str) -> Result<Option<Snapshot>>;

    /// Insert or replace a snapshot under its id
    async fn put(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Synced ticket storage
///
/// Tickets are scoped by `source`, the connector that fetched them, and
/// keyed by ticket id within a source. Writes for one source never touch
/// another source's tickets.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Delete every ticket of `source` and insert `tickets`, atomically
    async fn replace_all(&self, source: &str, tickets: &[TicketRecord]) -> Result<()>;

    /// Insert or replace each ticket of `source` by id
    async fn upsert_many(&self, source: &str, tickets: &[TicketRecord]) -> Result<()>;

    /// Stored tickets of every source, ordered by id
    async fn list_all(&self) -> Result<Vec<TicketRecord>>;
}

/// Named sync watermarks
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<DateTime<Utc>>>;

    /// Unconditionally store `value` under `key`
    async fn set(&self, key: &str, value: DateTime<Utc>) -> Result<()>;

    /// Move the watermark forward to `value`
    ///
    /// Returns `false` and leaves the stored value untouched when `value`
    /// is not later than the current watermark.
    async fn advance(&self, key: &str, value: DateTime<Utc>) -> Result<bool> {
        if let Some(current) = self.get(key).await?
            && value <= current
        {
            debug!(key, %current, requested = %value, "watermark not advanced");
            return Ok(false);
        }
        self.set(key, value).await?;
        Ok(true)
    }
}
