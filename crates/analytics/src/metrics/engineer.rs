//! Per-engineer productivity metrics

use chrono::{DateTime, Utc};
use deskpulse_protocol::TicketRecord;
use serde::{Deserialize, Serialize};

use crate::timerange::DateRange;

/// Hand-entered hours for one engineer and week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerHoursInput {
    pub engineer_name: String,
    pub total_hours_worked: f64,
    pub week_snapshot_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedEngineerMetrics {
    pub engineer_name: String,
    pub week_snapshot_id: String,
    pub total_hours_worked: f64,
    pub tickets_resolved: u64,
    /// `null` when no tickets were resolved
    pub average_time_per_ticket_hours: Option<f64>,
    pub computed_at: DateTime<Utc>,
}

/// Derive productivity figures from logged hours and a resolved count
pub fn compute_engineer_metrics(
    input: &EngineerHoursInput,
    tickets_resolved: u64,
    computed_at: DateTime<Utc>,
) -> DerivedEngineerMetrics {
    let average_time_per_ticket_hours = if tickets_resolved == 0 {
        None
    } else {
        Some(input.total_hours_worked / tickets_resolved as f64)
    };

    DerivedEngineerMetrics {
        engineer_name: input.engineer_name.clone(),
        week_snapshot_id: input.week_snapshot_id.clone(),
        total_hours_worked: input.total_hours_worked,
        tickets_resolved,
        average_time_per_ticket_hours,
        computed_at,
    }
}

/// Tickets assigned to `responder_id` that reached resolved/closed in `range`
///
/// The last update time stands in for the resolution time.
pub fn count_resolved_by_responder(
    tickets: &[TicketRecord],
    responder_id: u64,
    range: &DateRange,
) -> u64 {
    tickets
        .iter()
        .filter(|t| t.responder_id == Some(responder_id))
        .filter(|t| t.status.is_terminal())
        .filter(|t| range.contains(t.updated_at))
        .count() as u64
}
