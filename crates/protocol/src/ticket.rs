//! Ticket record types
//!
//! Mirrors the ticket representation returned by the helpdesk REST API.
//! Status and priority travel as integer codes on the wire; codes outside
//! the known set are preserved as `Other` so aggregation never fails on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ticket lifecycle status (wire codes 2..=5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum TicketStatus {
    Open,
    Pending,
    Resolved,
    Closed,
    /// Code not known to this build (custom statuses, future values)
    Other(i64),
}

impl TicketStatus {
    /// Parse a status from its wire code
    #[inline]
    pub const fn from_code(code: i64) -> Self {
        match code {
            2 => Self::Open,
            3 => Self::Pending,
            4 => Self::Resolved,
            5 => Self::Closed,
            other => Self::Other(other),
        }
    }

    /// Wire code for this status
    #[inline]
    pub const fn code(self) -> i64 {
        match self {
            Self::Open => 2,
            Self::Pending => 3,
            Self::Resolved => 4,
            Self::Closed => 5,
            Self::Other(code) => code,
        }
    }

    /// Resolved or closed
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Other(_) => "other",
        }
    }
}

impl From<i64> for TicketStatus {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl From<TicketStatus> for i64 {
    fn from(status: TicketStatus) -> Self {
        status.code()
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other(code) => write!(f, "other({})", code),
            known => write!(f, "{}", known.as_str()),
        }
    }
}

/// Ticket priority (wire codes 1..=4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
    Other(i64),
}

impl TicketPriority {
    #[inline]
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Low,
            2 => Self::Medium,
            3 => Self::High,
            4 => Self::Urgent,
            other => Self::Other(other),
        }
    }

    #[inline]
    pub const fn code(self) -> i64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
            Self::Other(code) => code,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
            Self::Other(_) => "other",
        }
    }
}

impl From<i64> for TicketPriority {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl From<TicketPriority> for i64 {
    fn from(priority: TicketPriority) -> Self {
        priority.code()
    }
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other(code) => write!(f, "other({})", code),
            known => write!(f, "{}", known.as_str()),
        }
    }
}

/// A single support ticket as fetched from the helpdesk
///
/// Identity is the ticket `id`: a later sync may return a newer version of
/// the same ticket, which replaces the stored one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub id: u64,
    #[serde(default)]
    pub subject: String,
    #[serde(default, alias = "description_text")]
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    #[serde(default)]
    pub group_id: Option<u64>,
    #[serde(default)]
    pub company_id: Option<u64>,
    #[serde(default)]
    pub responder_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_escalated: bool,
}

impl TicketRecord {
    /// Create a ticket with the required fields; everything else empty
    pub fn new(
        id: u64,
        status: TicketStatus,
        priority: TicketPriority,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            subject: String::new(),
            description: String::new(),
            status,
            priority,
            group_id: None,
            company_id: None,
            responder_id: None,
            created_at,
            updated_at,
            tags: Vec::new(),
            is_escalated: false,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_group(mut self, group_id: u64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_company(mut self, company_id: u64) -> Self {
        self.company_id = Some(company_id);
        self
    }

    pub fn with_responder(mut self, responder_id: u64) -> Self {
        self.responder_id = Some(responder_id);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn escalated(mut self) -> Self {
        self.is_escalated = true;
        self
    }

    /// Hours between creation and last update, never negative
    pub fn resolution_hours(&self) -> f64 {
        let seconds = (self.updated_at - self.created_at).num_seconds().max(0);
        seconds as f64 / 3600.0
    }
}
