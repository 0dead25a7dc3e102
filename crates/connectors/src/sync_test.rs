//! Tests for sync strategies and the single-flight runner

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use deskpulse_control::{MemoryStore, TicketStore, WatermarkStore};
use deskpulse_protocol::TicketStatus;
use serde_json::{Value, json};

use crate::error::ConnectorError;
use crate::scheduler::Job;
use crate::sync::{BulkReload, IncrementalSync, SyncJob, SyncMode, SyncRunner};
use crate::testing::{TestTransport, fast_resilience, ok_json, query_param, status, test_client};

fn started() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 6, 0, 0).unwrap()
}

fn ticket_json(id: u64, status: i64, updated: DateTime<Utc>) -> Value {
    json!({
        "id": id,
        "status": status,
        "priority": 2,
        "created_at": "2024-01-10T09:00:00Z",
        "updated_at": updated.to_rfc3339(),
    })
}

const WATERMARK: &str = "tickets:eu";

fn runner(transport: Arc<TestTransport>, store: Arc<MemoryStore>) -> SyncRunner {
    named_runner("eu", transport, store)
}

fn named_runner(name: &str, transport: Arc<TestTransport>, store: Arc<MemoryStore>) -> SyncRunner {
    let client = Arc::new(test_client(transport, fast_resilience()));
    SyncRunner::new(
        name,
        BulkReload::new(client.clone(), Duration::ZERO),
        IncrementalSync::new(client, Duration::ZERO),
        store.clone(),
        store,
    )
}

#[tokio::test]
async fn test_incremental_without_watermark_starts_at_year_start() {
    let transport = Arc::new(TestTransport::new(|_| {
        ok_json(json!([ticket_json(1, 2, started() - ChronoDuration::days(1))]))
    }));
    let store = Arc::new(MemoryStore::new());
    let runner = runner(transport.clone(), store.clone());

    let report = runner.run_incremental_at(started()).await.unwrap();

    assert_eq!(report.mode, SyncMode::Incremental);
    assert_eq!(report.since, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(report.tickets, 1);
    assert_eq!(
        query_param(&transport.requests()[0], "updated_since"),
        Some("2024-01-01T00%3A00%3A00Z")
    );
}

#[tokio::test]
async fn test_watermark_advances_to_start_time_not_newest_ticket() {
    // A ticket updated while the fetch was running
    let late = started() + ChronoDuration::minutes(5);
    let transport = Arc::new(TestTransport::new(move |_| {
        ok_json(json!([ticket_json(1, 2, late)]))
    }));
    let store = Arc::new(MemoryStore::new());
    let runner = runner(transport, store.clone());

    let report = runner.run_incremental_at(started()).await.unwrap();

    assert_eq!(report.watermark, Some(started()));
    assert_eq!(
        WatermarkStore::get(store.as_ref(), WATERMARK).await.unwrap(),
        Some(started())
    );
}

#[tokio::test]
async fn test_incremental_uses_stored_watermark_and_upserts() {
    let previous = started() - ChronoDuration::days(7);
    let transport = Arc::new(TestTransport::new(move |_| {
        ok_json(json!([ticket_json(1, 4, started() - ChronoDuration::hours(1))]))
    }));
    let store = Arc::new(MemoryStore::new());
    store.set(WATERMARK, previous).await.unwrap();
    store
        .upsert_many("eu", &[serde_json::from_value(ticket_json(1, 2, previous)).unwrap()])
        .await
        .unwrap();
    store
        .upsert_many("eu", &[serde_json::from_value(ticket_json(2, 2, previous)).unwrap()])
        .await
        .unwrap();
    let runner = runner(transport.clone(), store.clone());

    let report = runner.run_incremental_at(started()).await.unwrap();

    assert_eq!(report.since, previous);
    let tickets = store.list_all().await.unwrap();
    assert_eq!(tickets.len(), 2);
    assert_eq!(tickets[0].status, TicketStatus::Resolved);
    assert_eq!(tickets[1].status, TicketStatus::Open);
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_leaves_state_untouched() {
    let previous = started() - ChronoDuration::days(7);
    let transport = Arc::new(TestTransport::new(|_| Ok(status(500, ""))));
    let store = Arc::new(MemoryStore::new());
    store.set(WATERMARK, previous).await.unwrap();
    let runner = runner(transport, store.clone());

    let err = runner.run_incremental_at(started()).await.unwrap_err();

    assert!(matches!(err, ConnectorError::Request { .. }));
    assert_eq!(
        WatermarkStore::get(store.as_ref(), WATERMARK).await.unwrap(),
        Some(previous)
    );
    assert_eq!(store.ticket_count(), 0);
    assert!(!runner.is_running());
}

#[tokio::test]
async fn test_bulk_replaces_table_and_ignores_watermark() {
    let transport = Arc::new(TestTransport::new(|_| {
        ok_json(json!([
            ticket_json(5, 2, started()),
            ticket_json(6, 5, started()),
        ]))
    }));
    let store = Arc::new(MemoryStore::new());
    store
        .upsert_many("eu", &[serde_json::from_value(ticket_json(99, 2, started())).unwrap()])
        .await
        .unwrap();
    let runner = runner(transport.clone(), store.clone());

    let report = runner.run_bulk_at(started()).await.unwrap();

    assert_eq!(report.mode, SyncMode::Bulk);
    assert_eq!(report.tickets, 2);
    assert!(report.watermark.is_none());
    let ids: Vec<u64> = store.list_all().await.unwrap().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![5, 6]);
    assert!(
        WatermarkStore::get(store.as_ref(), WATERMARK)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test(start_paused = true)]
async fn test_second_run_while_busy_is_rejected() {
    // First call fails once so the first run sleeps in backoff
    let first_call = Arc::new(AtomicBool::new(true));
    let calls = Arc::new(AtomicU32::new(0));
    let (flag, counter) = (first_call.clone(), calls.clone());
    let transport = Arc::new(TestTransport::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        if flag.swap(false, Ordering::SeqCst) {
            Ok(status(503, ""))
        } else {
            ok_json(json!([]))
        }
    }));
    let store = Arc::new(MemoryStore::new());
    let runner = runner(transport, store);

    let (first, second) = tokio::join!(runner.run_incremental_at(started()), async {
        tokio::task::yield_now().await;
        runner.run_bulk_at(started()).await
    });

    assert!(first.is_ok());
    assert!(matches!(second, Err(ConnectorError::SyncInProgress)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!runner.is_running());

    // Free again once the first run finished
    assert!(runner.run_bulk_at(started()).await.is_ok());
}

#[tokio::test]
async fn test_sync_job_runs_incremental_mode() {
    let transport = Arc::new(TestTransport::new(|_| {
        ok_json(json!([ticket_json(3, 2, started())]))
    }));
    let store = Arc::new(MemoryStore::new());
    let runner = Arc::new(runner(transport, store.clone()));
    let job = SyncJob::new(runner, SyncMode::Incremental);

    job.run().await.unwrap();

    assert_eq!(store.ticket_count(), 1);
    assert!(
        WatermarkStore::get(store.as_ref(), WATERMARK)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_connectors_keep_separate_watermarks_and_tickets() {
    let eu_transport = Arc::new(TestTransport::new(|_| {
        ok_json(json!([ticket_json(1, 2, started())]))
    }));
    let us_transport = Arc::new(TestTransport::new(|_| {
        ok_json(json!([ticket_json(2, 2, started())]))
    }));
    let store = Arc::new(MemoryStore::new());
    let eu = named_runner("eu", eu_transport.clone(), store.clone());
    let us = named_runner("us", us_transport.clone(), store.clone());
    assert_eq!(us.watermark_key(), "tickets:us");

    eu.run_incremental_at(started()).await.unwrap();
    let us_report = us.run_incremental_at(started()).await.unwrap();

    // us has never synced, so it walks the whole year
    assert_eq!(us_report.since, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(
        query_param(&us_transport.requests()[0], "updated_since"),
        Some("2024-01-01T00%3A00%3A00Z")
    );

    eu.run_bulk_at(started()).await.unwrap();

    let ids: Vec<u64> = store.list_all().await.unwrap().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(
        WatermarkStore::get(store.as_ref(), "tickets:us").await.unwrap(),
        Some(started())
    );
    assert_eq!(
        WatermarkStore::get(store.as_ref(), "tickets:eu").await.unwrap(),
        Some(started())
    );
}
