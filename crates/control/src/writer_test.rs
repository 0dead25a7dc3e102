//! Tests for the idempotent snapshot writer

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use deskpulse_protocol::{SnapshotCategory, SnapshotPayload};

use crate::memory::MemoryStore;
use crate::store::SnapshotStore;
use crate::writer::SnapshotWriter;
use crate::ControlPlane;

fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 6, 0, 0).unwrap()
}

fn payload(total: u64) -> SnapshotPayload {
    SnapshotPayload::new().with_total("totalTickets", total)
}

#[tokio::test]
async fn test_second_write_same_day_is_noop() {
    let store = Arc::new(MemoryStore::new());
    let writer = SnapshotWriter::new(store.clone());

    let first = writer
        .write(SnapshotCategory::Weekly, payload(10), false, morning())
        .await
        .unwrap();
    assert_eq!(first.snapshot_id, "weekly_20240304");
    assert!(!first.already_exists);

    let later = morning() + Duration::hours(10);
    let second = writer
        .write(SnapshotCategory::Weekly, payload(99), false, later)
        .await
        .unwrap();
    assert!(second.already_exists);
    assert_eq!(second.snapshot_id, first.snapshot_id);
    assert_eq!(second.snapshot, first.snapshot);

    let stored = store.get("weekly_20240304").await.unwrap().unwrap();
    assert_eq!(stored.payload.totals["totalTickets"], 10);
    assert_eq!(stored.fetched_at, morning());
    assert_eq!(store.snapshot_count(), 1);
}

#[tokio::test]
async fn test_force_refresh_replaces_payload() {
    let store = Arc::new(MemoryStore::new());
    let writer = SnapshotWriter::new(store.clone());

    writer
        .write(SnapshotCategory::Performance, payload(1), false, morning())
        .await
        .unwrap();

    let later = morning() + Duration::hours(3);
    let refreshed = writer
        .write(SnapshotCategory::Performance, payload(2), true, later)
        .await
        .unwrap();
    assert!(!refreshed.already_exists);
    assert_eq!(refreshed.snapshot_id, "performance_20240304");

    let stored = store.get("performance_20240304").await.unwrap().unwrap();
    assert_eq!(stored.payload.totals["totalTickets"], 2);
    assert_eq!(stored.fetched_at, later);
    assert_eq!(store.snapshot_count(), 1);
}

#[tokio::test]
async fn test_new_day_gets_new_snapshot() {
    let store = Arc::new(MemoryStore::new());
    let writer = SnapshotWriter::new(store.clone());

    writer
        .write(SnapshotCategory::Telemetry, payload(1), false, morning())
        .await
        .unwrap();
    let next = writer
        .write(
            SnapshotCategory::Telemetry,
            payload(1),
            false,
            morning() + Duration::days(1),
        )
        .await
        .unwrap();

    assert!(!next.already_exists);
    assert_eq!(next.snapshot_id, "telemetry_20240305");
    assert_eq!(store.snapshot_count(), 2);
}

#[tokio::test]
async fn test_behavior_identical_across_categories() {
    for category in SnapshotCategory::ALL {
        let writer = SnapshotWriter::new(Arc::new(MemoryStore::new()));

        let first = writer
            .write(category, payload(1), false, morning())
            .await
            .unwrap();
        let second = writer
            .write(category, payload(2), false, morning())
            .await
            .unwrap();
        let forced = writer
            .write(category, payload(3), true, morning())
            .await
            .unwrap();

        assert!(!first.already_exists, "{category}");
        assert!(second.already_exists, "{category}");
        assert!(!forced.already_exists, "{category}");
        assert_eq!(forced.snapshot.payload.totals["totalTickets"], 3);
    }
}

#[tokio::test]
async fn test_writer_over_turso_store() {
    let cp = Arc::new(ControlPlane::new_memory().await.unwrap());
    let writer = SnapshotWriter::new(cp.clone());

    writer
        .write(SnapshotCategory::Weekly, payload(5), false, morning())
        .await
        .unwrap();
    let again = writer
        .write(SnapshotCategory::Weekly, payload(6), false, morning())
        .await
        .unwrap();

    assert!(again.already_exists);
    assert_eq!(again.snapshot.payload.totals["totalTickets"], 5);
}
