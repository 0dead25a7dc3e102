//! Metrics aggregation engine
//!
//! Pure functions over in-memory tickets. Nothing here performs I/O or
//! reads the clock: `computed_at` is always supplied by the caller.
//!
//! - **summary**: counts, breakdowns, resolution time, tags
//! - **engineer**: per-engineer productivity

pub mod engineer;
pub mod summary;

pub use engineer::{
    DerivedEngineerMetrics, EngineerHoursInput, compute_engineer_metrics,
    count_resolved_by_responder,
};
pub use summary::{
    GroupBreakdown, PriorityBreakdown, TOP_TAGS, TagCount, TagsAnalysis, TicketSummary,
    TopCompany, UNASSIGNED_GROUP, summarize,
};

use chrono::{DateTime, NaiveDate, Utc};
use deskpulse_protocol::{SnapshotPayload, TicketRecord};
use serde::{Deserialize, Serialize};

use crate::labels::Labels;
use crate::timerange::DateRange;

/// Metrics for one Monday-to-Sunday week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyMetrics {
    pub week_start_date: NaiveDate,
    pub week_end_date: NaiveDate,
    #[serde(flatten)]
    pub summary: TicketSummary,
    pub computed_at: DateTime<Utc>,
}

/// Metrics for an arbitrary inclusive range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeMetrics {
    pub date_range: DateRange,
    #[serde(flatten)]
    pub summary: TicketSummary,
    pub computed_at: DateTime<Utc>,
}

/// Compute metrics for the week containing `week_of`
pub fn compute_weekly_metrics(
    tickets: &[TicketRecord],
    labels: &Labels,
    week_of: NaiveDate,
    computed_at: DateTime<Utc>,
) -> WeeklyMetrics {
    let week = DateRange::week_containing(week_of);
    WeeklyMetrics {
        week_start_date: week.start.date_naive(),
        week_end_date: week.end.date_naive(),
        summary: summarize(tickets, labels, &week),
        computed_at,
    }
}

/// Compute metrics for tickets created inside `range`
pub fn compute_date_range_metrics(
    tickets: &[TicketRecord],
    labels: &Labels,
    range: DateRange,
    computed_at: DateTime<Utc>,
) -> DateRangeMetrics {
    DateRangeMetrics {
        date_range: range,
        summary: summarize(tickets, labels, &range),
        computed_at,
    }
}

impl WeeklyMetrics {
    /// Convert into the body of a `weekly` snapshot
    pub fn to_snapshot_payload(&self) -> SnapshotPayload {
        let s = &self.summary;
        SnapshotPayload::new()
            .with_total("weekStartDate", self.week_start_date.to_string())
            .with_total("weekEndDate", self.week_end_date.to_string())
            .with_total("totalTickets", s.total_tickets)
            .with_total("ticketsOpen", s.tickets_open)
            .with_total("ticketsPending", s.tickets_pending)
            .with_total("ticketsResolved", s.tickets_resolved)
            .with_total("ticketsClosed", s.tickets_closed)
            .with_total("urgentTickets", s.urgent_tickets)
            .with_total("escalatedTickets", s.escalated_tickets)
            .with_total("avgResolutionTimeHours", s.avg_resolution_time_hours)
            .with_total(
                "topCompany",
                serde_json::to_value(&s.top_company).unwrap_or_default(),
            )
            .with_breakdown(
                "byGroup",
                serde_json::to_value(&s.group_breakdown).unwrap_or_default(),
            )
            .with_breakdown(
                "byPriority",
                serde_json::to_value(&s.priority_breakdown).unwrap_or_default(),
            )
            .with_breakdown(
                "topTags",
                serde_json::to_value(&s.tags_analysis.tag_breakdown).unwrap_or_default(),
            )
    }
}
