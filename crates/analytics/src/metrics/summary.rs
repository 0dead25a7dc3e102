//! Ticket summary shared by weekly and date-range metrics
//!
//! All counts are over tickets *created* inside the window. Statuses or
//! priorities outside the known set match no bucket, so the bucket sums may
//! be lower than `total_tickets`.

use std::cmp::Reverse;
use std::collections::HashMap;

use deskpulse_protocol::{TicketPriority, TicketRecord, TicketStatus};
use serde::{Deserialize, Serialize};

use crate::labels::Labels;
use crate::timerange::DateRange;

/// Number of tags reported in `tagBreakdown`
pub const TOP_TAGS: usize = 10;

/// Label used for tickets without a group
pub const UNASSIGNED_GROUP: &str = "Unassigned";

/// Aggregate counts for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    pub total_tickets: u64,
    pub tickets_open: u64,
    pub tickets_pending: u64,
    pub tickets_resolved: u64,
    pub tickets_closed: u64,
    pub urgent_tickets: u64,
    pub escalated_tickets: u64,
    pub priority_breakdown: PriorityBreakdown,
    pub group_breakdown: Vec<GroupBreakdown>,
    /// Company with the most tickets; `null` when no ticket has a company
    pub top_company: Option<TopCompany>,
    /// Mean of `updated_at - created_at` over resolved/closed tickets;
    /// `null` when there are none
    pub avg_resolution_time_hours: Option<f64>,
    pub tags_analysis: TagsAnalysis,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub urgent: u64,
}

/// Per-group status buckets
///
/// `resolved` counts both resolved and closed tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBreakdown {
    pub group_id: Option<u64>,
    pub group_name: String,
    pub total: u64,
    pub resolved: u64,
    pub open: u64,
    pub pending: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCompany {
    pub company_id: u64,
    pub company_name: String,
    pub ticket_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagsAnalysis {
    pub unique_tags: u64,
    pub total_tag_usages: u64,
    /// Top tags by count descending, ties by tag name
    pub tag_breakdown: Vec<TagCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

#[derive(Default)]
struct GroupCounts {
    total: u64,
    resolved: u64,
    open: u64,
    pending: u64,
}

/// Summarize the tickets created inside `range`
pub fn summarize(tickets: &[TicketRecord], labels: &Labels, range: &DateRange) -> TicketSummary {
    let mut summary = TicketSummary {
        total_tickets: 0,
        tickets_open: 0,
        tickets_pending: 0,
        tickets_resolved: 0,
        tickets_closed: 0,
        urgent_tickets: 0,
        escalated_tickets: 0,
        priority_breakdown: PriorityBreakdown::default(),
        group_breakdown: Vec::new(),
        top_company: None,
        avg_resolution_time_hours: None,
        tags_analysis: TagsAnalysis::default(),
    };

    let mut groups: HashMap<Option<u64>, GroupCounts> = HashMap::new();
    let mut companies: HashMap<u64, u64> = HashMap::new();
    let mut tags: HashMap<&str, u64> = HashMap::new();
    let mut resolution_hours = 0.0;
    let mut resolved_count = 0u64;

    for ticket in tickets.iter().filter(|t| range.contains(t.created_at)) {
        summary.total_tickets += 1;

        match ticket.status {
            TicketStatus::Open => summary.tickets_open += 1,
            TicketStatus::Pending => summary.tickets_pending += 1,
            TicketStatus::Resolved => summary.tickets_resolved += 1,
            TicketStatus::Closed => summary.tickets_closed += 1,
            TicketStatus::Other(_) => {}
        }

        match ticket.priority {
            TicketPriority::Low => summary.priority_breakdown.low += 1,
            TicketPriority::Medium => summary.priority_breakdown.medium += 1,
            TicketPriority::High => summary.priority_breakdown.high += 1,
            TicketPriority::Urgent => {
                summary.priority_breakdown.urgent += 1;
                summary.urgent_tickets += 1;
            }
            TicketPriority::Other(_) => {}
        }

        if ticket.is_escalated {
            summary.escalated_tickets += 1;
        }

        let group = groups.entry(ticket.group_id).or_default();
        group.total += 1;
        match ticket.status {
            TicketStatus::Resolved | TicketStatus::Closed => group.resolved += 1,
            TicketStatus::Open => group.open += 1,
            TicketStatus::Pending => group.pending += 1,
            TicketStatus::Other(_) => {}
        }

        if let Some(company_id) = ticket.company_id {
            *companies.entry(company_id).or_default() += 1;
        }

        for tag in &ticket.tags {
            let tag = tag.trim();
            if !tag.is_empty() {
                *tags.entry(tag).or_default() += 1;
            }
        }

        if ticket.status.is_terminal() {
            resolution_hours += ticket.resolution_hours();
            resolved_count += 1;
        }
    }

    summary.group_breakdown = group_rows(groups, labels);
    summary.top_company = top_company(&companies, labels);
    summary.tags_analysis = tags_analysis(tags);
    if resolved_count > 0 {
        summary.avg_resolution_time_hours = Some(resolution_hours / resolved_count as f64);
    }

    summary
}

fn group_rows(groups: HashMap<Option<u64>, GroupCounts>, labels: &Labels) -> Vec<GroupBreakdown> {
    let mut rows: Vec<GroupBreakdown> = groups
        .into_iter()
        .map(|(group_id, counts)| GroupBreakdown {
            group_id,
            group_name: match group_id {
                Some(id) => labels.group_name(id),
                None => UNASSIGNED_GROUP.to_string(),
            },
            total: counts.total,
            resolved: counts.resolved,
            open: counts.open,
            pending: counts.pending,
        })
        .collect();

    // Unassigned sorts after every real group with the same total
    rows.sort_by_key(|r| (Reverse(r.total), r.group_id.is_none(), r.group_id));
    rows
}

fn top_company(companies: &HashMap<u64, u64>, labels: &Labels) -> Option<TopCompany> {
    companies
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(&company_id, &ticket_count)| TopCompany {
            company_id,
            company_name: labels.company_name(company_id),
            ticket_count,
        })
}

fn tags_analysis(tags: HashMap<&str, u64>) -> TagsAnalysis {
    let unique_tags = tags.len() as u64;
    let total_tag_usages = tags.values().sum();

    let mut tag_breakdown: Vec<TagCount> = tags
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    tag_breakdown.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    tag_breakdown.truncate(TOP_TAGS);

    TagsAnalysis {
        unique_tags,
        total_tag_usages,
        tag_breakdown,
    }
}
