//! Idempotent snapshot writer
//!
//! One snapshot per category per UTC day. A second write on the same day is
//! a successful no-op returning the stored snapshot, unless the caller
//! forces a refresh, in which case the snapshot is replaced under the same
//! id with the new payload and `fetchedAt`.
//!
//! The lookup and the write are not atomic. Two processes racing on the
//! same id both write, and the later write wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use deskpulse_protocol::{Snapshot, SnapshotCategory, SnapshotPayload};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::store::SnapshotStore;

/// Result of a [`SnapshotWriter::write`] call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub snapshot_id: String,
    pub already_exists: bool,
    /// The stored snapshot after the call
    #[serde(skip)]
    pub snapshot: Snapshot,
}

pub struct SnapshotWriter {
    store: Arc<dyn SnapshotStore>,
}

impl SnapshotWriter {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// Persist `payload` as today's snapshot for `category`
    ///
    /// `now` supplies both the day used for the id and `fetchedAt`.
    pub async fn write(
        &self,
        category: SnapshotCategory,
        payload: SnapshotPayload,
        force_refresh: bool,
        now: DateTime<Utc>,
    ) -> Result<WriteOutcome> {
        let snapshot_id = category.snapshot_id(now.date_naive());

        if !force_refresh && let Some(existing) = self.store.get(&snapshot_id).await? {
            debug!(snapshot_id = %snapshot_id, "Snapshot already exists, skipping write");
            return Ok(WriteOutcome {
                snapshot_id,
                already_exists: true,
                snapshot: existing,
            });
        }

        let snapshot = Snapshot::new(category, payload, now);
        self.store.put(&snapshot).await?;

        info!(
            snapshot_id = %snapshot_id,
            category = %category,
            force_refresh,
            "Snapshot written"
        );

        Ok(WriteOutcome {
            snapshot_id,
            already_exists: false,
            snapshot,
        })
    }

    /// [`write`](Self::write) at the current time
    pub async fn write_now(
        &self,
        category: SnapshotCategory,
        payload: SnapshotPayload,
        force_refresh: bool,
    ) -> Result<WriteOutcome> {
        self.write(category, payload, force_refresh, Utc::now()).await
    }
}
