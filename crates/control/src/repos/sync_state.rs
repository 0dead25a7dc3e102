//! Sync watermark repository

use chrono::{DateTime, Utc};
use turso::Database;

use crate::error::{ControlError, Result};

pub struct SyncStateRepo<'a> {
    db: &'a Database,
}

impl<'a> SyncStateRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let conn = self.db.connect()?;

        let mut rows = conn
            .query("SELECT watermark FROM sync_state WHERE key = ?1", [key])
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let value = row.get_value(0)?;
        let raw = value
            .as_text()
            .ok_or_else(|| ControlError::invalid("watermark", "value is not text"))?;
        let parsed = DateTime::parse_from_rfc3339(raw)
            .map_err(|e| ControlError::invalid("watermark", e.to_string()))?;
        Ok(Some(parsed.with_timezone(&Utc)))
    }

    pub async fn set(&self, key: &str, value: DateTime<Utc>) -> Result<()> {
        let conn = self.db.connect()?;

        let watermark = value.to_rfc3339();
        let updated_at = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT OR REPLACE INTO sync_state (key, watermark, updated_at)
            VALUES (?1, ?2, ?3)
            "#,
            [key, watermark.as_str(), updated_at.as_str()],
        )
        .await?;

        Ok(())
    }
}
