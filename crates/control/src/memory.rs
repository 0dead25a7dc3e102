//! In-process store
//!
//! Backs tests and `[store] memory = true`. Nothing survives a restart.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deskpulse_protocol::{Snapshot, TicketRecord};
use parking_lot::RwLock;

use crate::error::Result;
use crate::store::{SnapshotStore, TicketStore, WatermarkStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: RwLock<HashMap<String, Snapshot>>,
    /// Keyed by (ticket id, source)
    tickets: RwLock<BTreeMap<(u64, String), TicketRecord>>,
    watermarks: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.read().len()
    }

    /// Number of stored tickets
    pub fn ticket_count(&self) -> usize {
        self.tickets.read().len()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn get(&self, snapshot_id: &str) -> Result<Option<Snapshot>> {
        Ok(self.snapshots.read().get(snapshot_id).cloned())
    }

    async fn put(&self, snapshot: &Snapshot) -> Result<()> {
        self.snapshots
            .write()
            .insert(snapshot.snapshot_id.clone(), snapshot.clone());
        Ok(())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn replace_all(&self, source: &str, tickets: &[TicketRecord]) -> Result<()> {
        let mut stored = self.tickets.write();
        stored.retain(|(_, owner), _| owner != source);
        for ticket in tickets {
            stored.insert((ticket.id, source.to_string()), ticket.clone());
        }
        Ok(())
    }

    async fn upsert_many(&self, source: &str, tickets: &[TicketRecord]) -> Result<()> {
        let mut stored = self.tickets.write();
        for ticket in tickets {
            stored.insert((ticket.id, source.to_string()), ticket.clone());
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<TicketRecord>> {
        Ok(self.tickets.read().values().cloned().collect())
    }
}

#[async_trait]
impl WatermarkStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.watermarks.read().get(key).copied())
    }

    async fn set(&self, key: &str, value: DateTime<Utc>) -> Result<()> {
        self.watermarks.write().insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use deskpulse_protocol::{TicketPriority, TicketStatus};

    fn ticket(id: u64, status: TicketStatus) -> TicketRecord {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        TicketRecord::new(id, status, TicketPriority::Low, at, at)
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = MemoryStore::new();
        store
            .upsert_many("eu", &[ticket(2, TicketStatus::Open), ticket(1, TicketStatus::Open)])
            .await
            .unwrap();
        store
            .upsert_many("eu", &[ticket(2, TicketStatus::Closed)])
            .await
            .unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[1].status, TicketStatus::Closed);
    }

    #[tokio::test]
    async fn test_replace_all_drops_missing() {
        let store = MemoryStore::new();
        store
            .upsert_many("eu", &[ticket(1, TicketStatus::Open), ticket(2, TicketStatus::Open)])
            .await
            .unwrap();
        store
            .replace_all("eu", &[ticket(3, TicketStatus::Pending)])
            .await
            .unwrap();

        let ids: Vec<u64> = store.list_all().await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[tokio::test]
    async fn test_sources_are_isolated() {
        let store = MemoryStore::new();
        store
            .upsert_many("eu", &[ticket(1, TicketStatus::Open)])
            .await
            .unwrap();
        store
            .upsert_many("us", &[ticket(1, TicketStatus::Closed), ticket(2, TicketStatus::Open)])
            .await
            .unwrap();
        store
            .replace_all("eu", &[ticket(3, TicketStatus::Pending)])
            .await
            .unwrap();

        let all = store.list_all().await.unwrap();
        let ids: Vec<u64> = all.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(all[0].status, TicketStatus::Closed);
        assert_eq!(store.ticket_count(), 3);
    }

    #[tokio::test]
    async fn test_watermark_only_moves_forward() {
        let store = MemoryStore::new();
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        assert!(WatermarkStore::get(&store, "tickets").await.unwrap().is_none());
        assert!(store.advance("tickets", late).await.unwrap());
        assert!(!store.advance("tickets", early).await.unwrap());
        assert!(!store.advance("tickets", late).await.unwrap());
        assert_eq!(
            WatermarkStore::get(&store, "tickets").await.unwrap(),
            Some(late)
        );
    }
}
