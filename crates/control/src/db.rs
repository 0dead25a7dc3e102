//! Database connection and schema management
//!
//! Uses Turso (async SQLite-compatible) as the durable store.

use std::path::Path;

use tracing::info;
use turso::{Builder, Database};

use crate::error::{ControlError, Result};
use crate::repos::{SnapshotRepo, SyncStateRepo, TicketRepo};

/// Turso-backed store for snapshots, tickets and sync watermarks
pub struct ControlPlane {
    db: Database,
}

impl ControlPlane {
    /// Open (or create) a file-based database
    ///
    /// The parent directory is created when missing.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ControlError::invalid("path", format!("failed to create directory: {}", e))
            })?;
        }

        let path_str = path
            .to_str()
            .ok_or_else(|| ControlError::invalid("path", "path is not valid UTF-8"))?;
        info!(path = %path_str, "Opening store database");

        let db = Builder::new_local(path_str).build().await?;
        let cp = Self { db };
        cp.init_schema().await?;
        Ok(cp)
    }

    /// Create an in-memory database (for testing)
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        let cp = Self { db };
        cp.init_schema().await?;
        Ok(cp)
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn snapshots(&self) -> SnapshotRepo<'_> {
        SnapshotRepo::new(&self.db)
    }

    pub fn tickets(&self) -> TicketRepo<'_> {
        TicketRepo::new(&self.db)
    }

    pub fn sync_state(&self) -> SyncStateRepo<'_> {
        SyncStateRepo::new(&self.db)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.db.connect()?;

        conn.execute(SCHEMA_SNAPSHOTS, ()).await?;
        conn.execute(SCHEMA_TICKETS, ()).await?;
        conn.execute(SCHEMA_SYNC_STATE, ()).await?;

        conn.execute(INDEX_SNAPSHOTS_CATEGORY, ()).await?;
        conn.execute(INDEX_TICKETS_SOURCE, ()).await?;

        info!("Store schema initialized");
        Ok(())
    }
}

// =============================================================================
// Schema
// =============================================================================

const SCHEMA_SNAPSHOTS: &str = r#"
CREATE TABLE IF NOT EXISTS snapshots (
    snapshot_id TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    body TEXT NOT NULL
)
"#;

const SCHEMA_TICKETS: &str = r#"
CREATE TABLE IF NOT EXISTS tickets (
    key TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    id TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    body TEXT NOT NULL
)
"#;

const SCHEMA_SYNC_STATE: &str = r#"
CREATE TABLE IF NOT EXISTS sync_state (
    key TEXT PRIMARY KEY,
    watermark TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

const INDEX_SNAPSHOTS_CATEGORY: &str =
    "CREATE INDEX IF NOT EXISTS idx_snapshots_category ON snapshots(category)";

const INDEX_TICKETS_SOURCE: &str =
    "CREATE INDEX IF NOT EXISTS idx_tickets_source ON tickets(source)";
