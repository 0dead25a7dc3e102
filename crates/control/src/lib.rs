//! Deskpulse Control Plane
//!
//! Durable state for the ingestion pipeline: dated snapshots, the synced
//! ticket table and sync watermarks.
//!
//! # Stores
//!
//! | Store | Backing | Use |
//! |-------|---------|-----|
//! | [`ControlPlane`] | Turso (file or `:memory:`) | Production |
//! | [`MemoryStore`] | `parking_lot` maps | Tests, throwaway runs |
//!
//! Both implement [`SnapshotStore`], [`TicketStore`] and [`WatermarkStore`],
//! so callers hold `Arc<dyn ...>` and never name the backend.
//!
//! # Usage
//!
//! ```ignore
//! use deskpulse_control::{ControlPlane, SnapshotWriter};
//!
//! let cp = Arc::new(ControlPlane::new("data/deskpulse.db").await?);
//! let writer = SnapshotWriter::new(cp.clone());
//! let outcome = writer.write_now(SnapshotCategory::Weekly, payload, false).await?;
//! ```

pub mod db;
pub mod error;
pub mod memory;
pub mod repos;
pub mod store;
pub mod writer;

#[cfg(test)]
mod writer_test;

pub use db::ControlPlane;
pub use error::{ControlError, Result};
pub use memory::MemoryStore;
pub use repos::{SnapshotRepo, SyncStateRepo, TicketRepo};
pub use store::{SnapshotStore, TicketStore, WatermarkStore};
pub use writer::{SnapshotWriter, WriteOutcome};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deskpulse_protocol::{Snapshot, TicketRecord};

#[async_trait]
impl SnapshotStore for ControlPlane {
    async fn get(&self, snapshot_id: &str) -> Result<Option<Snapshot>> {
        self.snapshots().get(snapshot_id).await
    }

    async fn put(&self, snapshot: &Snapshot) -> Result<()> {
        self.snapshots().upsert(snapshot).await
    }
}

#[async_trait]
impl TicketStore for ControlPlane {
    async fn replace_all(&self, source: &str, tickets: &[TicketRecord]) -> Result<()> {
        self.tickets().replace_all(source, tickets).await
    }

    async fn upsert_many(&self, source: &str, tickets: &[TicketRecord]) -> Result<()> {
        self.tickets().upsert_many(source, tickets).await
    }

    async fn list_all(&self) -> Result<Vec<TicketRecord>> {
        self.tickets().list_all().await
    }
}

#[async_trait]
impl WatermarkStore for ControlPlane {
    async fn get(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        self.sync_state().get(key).await
    }

    async fn set(&self, key: &str, value: DateTime<Utc>) -> Result<()> {
        self.sync_state().set(key, value).await
    }
}
