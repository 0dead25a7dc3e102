//! Ticket repository
//!
//! Tickets are keyed by `source:id` and stored as JSON. Bulk reload of a
//! source runs inside a single transaction so a failure leaves that
//! source's previous set in place.

use deskpulse_protocol::TicketRecord;
use tracing::{debug, warn};
use turso::{Connection, Database};

use crate::error::{ControlError, Result};

const UPSERT_TICKET: &str = r#"
INSERT OR REPLACE INTO tickets (key, source, id, updated_at, body)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub struct TicketRepo<'a> {
    db: &'a Database,
}

impl<'a> TicketRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Delete every ticket of `source` and insert `tickets` in one transaction
    pub async fn replace_all(&self, source: &str, tickets: &[TicketRecord]) -> Result<()> {
        let conn = self.db.connect()?;

        conn.execute("BEGIN", ()).await?;
        let outcome: Result<()> = async {
            conn.execute("DELETE FROM tickets WHERE source = ?1", [source])
                .await?;
            Self::insert_all(&conn, source, tickets).await
        }
        .await;

        match outcome {
            Ok(()) => {
                conn.execute("COMMIT", ()).await?;
                debug!(source, count = tickets.len(), "Replaced source tickets");
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = conn.execute("ROLLBACK", ()).await {
                    warn!(error = %rollback, "Rollback failed after ticket reload error");
                }
                Err(e)
            }
        }
    }

    /// Insert or replace each ticket of `source` by id
    pub async fn upsert_many(&self, source: &str, tickets: &[TicketRecord]) -> Result<()> {
        let conn = self.db.connect()?;

        conn.execute("BEGIN", ()).await?;
        match Self::insert_all(&conn, source, tickets).await {
            Ok(()) => {
                conn.execute("COMMIT", ()).await?;
                debug!(source, count = tickets.len(), "Upserted tickets");
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = conn.execute("ROLLBACK", ()).await {
                    warn!(error = %rollback, "Rollback failed after ticket upsert error");
                }
                Err(e)
            }
        }
    }

    /// Tickets of every source ordered by id
    pub async fn list_all(&self) -> Result<Vec<TicketRecord>> {
        let conn = self.db.connect()?;

        let mut rows = conn
            .query("SELECT body FROM tickets ORDER BY source", ())
            .await?;

        let mut tickets = Vec::new();
        while let Some(row) = rows.next().await? {
            let value = row.get_value(0)?;
            let body = value
                .as_text()
                .ok_or_else(|| ControlError::invalid("ticket", "body is not text"))?;
            tickets.push(serde_json::from_str::<TicketRecord>(body)?);
        }

        // ids are stored as text; order numerically here, stable within a source
        tickets.sort_by_key(|t| t.id);
        Ok(tickets)
    }

    async fn insert_all(conn: &Connection, source: &str, tickets: &[TicketRecord]) -> Result<()> {
        for ticket in tickets {
            let id = ticket.id.to_string();
            let key = format!("{}:{}", source, id);
            let updated_at = ticket.updated_at.to_rfc3339();
            let body = serde_json::to_string(ticket)?;
            conn.execute(
                UPSERT_TICKET,
                [
                    key.as_str(),
                    source,
                    id.as_str(),
                    updated_at.as_str(),
                    body.as_str(),
                ],
            )
            .await?;
        }
        Ok(())
    }
}
