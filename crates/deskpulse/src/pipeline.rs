//! Weekly snapshot pipeline
//!
//! Stored tickets -> previous-week metrics -> `weekly` snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deskpulse_analytics::{DateRange, Labels, WeeklyMetrics, compute_weekly_metrics};
use deskpulse_connectors::{Job, LabelDirectory};
use deskpulse_control::{SnapshotStore, SnapshotWriter, TicketStore, WriteOutcome};
use deskpulse_protocol::SnapshotCategory;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyOutcome {
    #[serde(flatten)]
    pub write: WriteOutcome,
    pub metrics: WeeklyMetrics,
}

pub struct WeeklySnapshot {
    tickets: Arc<dyn TicketStore>,
    writer: SnapshotWriter,
    labels: Option<Arc<LabelDirectory>>,
}

impl WeeklySnapshot {
    pub fn new(tickets: Arc<dyn TicketStore>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self {
            tickets,
            writer: SnapshotWriter::new(snapshots),
            labels: None,
        }
    }

    /// Resolve group and company names through the helpdesk
    pub fn with_labels(mut self, labels: Arc<LabelDirectory>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Snapshot the last full week before `now`
    pub async fn run_at(
        &self,
        now: DateTime<Utc>,
        force_refresh: bool,
    ) -> deskpulse_control::Result<WeeklyOutcome> {
        let week = DateRange::previous_week(now);
        let tickets = self.tickets.list_all().await?;
        let labels = match &self.labels {
            Some(directory) => directory.labels(std::time::Instant::now()).await,
            None => Labels::default(),
        };

        let metrics = compute_weekly_metrics(&tickets, &labels, week.start.date_naive(), now);
        let write = self
            .writer
            .write(
                SnapshotCategory::Weekly,
                metrics.to_snapshot_payload(),
                force_refresh,
                now,
            )
            .await?;

        info!(
            snapshot_id = %write.snapshot_id,
            already_exists = write.already_exists,
            week_start = %metrics.week_start_date,
            total_tickets = metrics.summary.total_tickets,
            "weekly snapshot"
        );
        Ok(WeeklyOutcome { write, metrics })
    }
}

#[async_trait]
impl Job for WeeklySnapshot {
    async fn run(&self) -> deskpulse_connectors::Result<()> {
        self.run_at(Utc::now(), false).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use deskpulse_control::MemoryStore;
    use deskpulse_protocol::{TicketPriority, TicketRecord, TicketStatus};

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, d, h, 0, 0).unwrap()
    }

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let tickets = vec![
            // Previous week: Mon 2024-04-29 .. Sun 2024-05-05
            TicketRecord::new(1, TicketStatus::Open, TicketPriority::Urgent, at(1, 9), at(1, 9))
                .with_group(7),
            TicketRecord::new(2, TicketStatus::Resolved, TicketPriority::Low, at(2, 9), at(2, 13)),
            // Current week, excluded
            TicketRecord::new(3, TicketStatus::Open, TicketPriority::Low, at(6, 9), at(6, 9)),
        ];
        store.upsert_many("eu", &tickets).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_previous_week_snapshot() {
        let store = seeded().await;
        let pipeline = WeeklySnapshot::new(store.clone(), store.clone());

        let outcome = pipeline.run_at(at(6, 7), false).await.unwrap();

        assert_eq!(outcome.write.snapshot_id, "weekly_20240506");
        assert!(!outcome.write.already_exists);
        assert_eq!(outcome.metrics.week_start_date.to_string(), "2024-04-29");
        assert_eq!(outcome.metrics.summary.total_tickets, 2);
        assert_eq!(outcome.metrics.summary.urgent_tickets, 1);

        let stored = store.get("weekly_20240506").await.unwrap().unwrap();
        assert_eq!(stored.category, SnapshotCategory::Weekly);
        assert_eq!(stored.payload.totals["totalTickets"], 2);
        assert!(stored.payload.breakdowns.contains_key("byGroup"));
        assert!(stored.payload.breakdowns.contains_key("byPriority"));
        assert!(stored.payload.breakdowns.contains_key("topTags"));
    }

    #[tokio::test]
    async fn test_second_run_same_day_is_noop() {
        let store = seeded().await;
        let pipeline = WeeklySnapshot::new(store.clone(), store.clone());
        pipeline.run_at(at(6, 7), false).await.unwrap();

        store
            .upsert_many("eu", &[TicketRecord::new(
                4,
                TicketStatus::Open,
                TicketPriority::Low,
                at(3, 9),
                at(3, 9),
            )])
            .await
            .unwrap();
        let again = pipeline.run_at(at(6, 8), false).await.unwrap();
        assert!(again.write.already_exists);
        assert_eq!(again.write.snapshot.payload.totals["totalTickets"], 2);

        let forced = pipeline.run_at(at(6, 9), true).await.unwrap();
        assert!(!forced.write.already_exists);
        assert_eq!(forced.write.snapshot.payload.totals["totalTickets"], 3);
        assert_eq!(store.snapshot_count(), 1);
    }
}
