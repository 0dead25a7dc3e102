//! Snapshot repository
//!
//! The full snapshot is stored as JSON in `body`; the id, category and
//! fetch time are duplicated into columns for listing.

use deskpulse_protocol::{Snapshot, SnapshotCategory};
use turso::Database;

use crate::error::{ControlError, Result};

pub struct SnapshotRepo<'a> {
    db: &'a Database,
}

impl<'a> SnapshotRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get a snapshot by id
    pub async fn get(&self, snapshot_id: &str) -> Result<Option<Snapshot>> {
        let conn = self.db.connect()?;

        let mut rows = conn
            .query(
                "SELECT body FROM snapshots WHERE snapshot_id = ?1",
                [snapshot_id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_snapshot(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Insert or replace a snapshot
    pub async fn upsert(&self, snapshot: &Snapshot) -> Result<()> {
        let conn = self.db.connect()?;

        let body = serde_json::to_string(snapshot)?;
        let fetched_at = snapshot.fetched_at.to_rfc3339();

        conn.execute(
            r#"
            INSERT OR REPLACE INTO snapshots (snapshot_id, category, fetched_at, body)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            [
                snapshot.snapshot_id.as_str(),
                snapshot.category.as_str(),
                fetched_at.as_str(),
                body.as_str(),
            ],
        )
        .await?;

        Ok(())
    }

    /// Snapshots of one category, newest first
    pub async fn list_for_category(&self, category: SnapshotCategory) -> Result<Vec<Snapshot>> {
        let conn = self.db.connect()?;

        let mut rows = conn
            .query(
                "SELECT body FROM snapshots WHERE category = ?1 ORDER BY snapshot_id DESC",
                [category.as_str()],
            )
            .await?;

        let mut snapshots = Vec::new();
        while let Some(row) = rows.next().await? {
            snapshots.push(Self::row_to_snapshot(&row)?);
        }

        Ok(snapshots)
    }

    fn row_to_snapshot(row: &turso::Row) -> Result<Snapshot> {
        let value = row.get_value(0)?;
        let body = value
            .as_text()
            .ok_or_else(|| ControlError::invalid("snapshot", "body is not text"))?;
        Ok(serde_json::from_str(body)?)
    }
}
