//! Dated snapshot types
//!
//! A snapshot is an immutable aggregate keyed by `{category}_{YYYYMMDD}`.
//! At most one snapshot exists per category and calendar day (UTC).

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Snapshot category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotCategory {
    /// Usage telemetry pulled from the external analytics source
    Telemetry,
    /// Performance figures pulled from the external analytics source
    Performance,
    /// Weekly ticket metrics computed from synced tickets
    Weekly,
}

impl SnapshotCategory {
    pub const ALL: [SnapshotCategory; 3] = [Self::Telemetry, Self::Performance, Self::Weekly];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Telemetry => "telemetry",
            Self::Performance => "performance",
            Self::Weekly => "weekly",
        }
    }

    /// Snapshot id for this category on the given day
    pub fn snapshot_id(self, day: NaiveDate) -> String {
        snapshot_id(self.as_str(), day)
    }
}

impl std::fmt::Display for SnapshotCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotCategory {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "telemetry" => Ok(Self::Telemetry),
            "performance" => Ok(Self::Performance),
            "weekly" => Ok(Self::Weekly),
            other => Err(ProtocolError::UnknownCategory(other.to_string())),
        }
    }
}

/// Derive the snapshot id for a category and calendar day
///
/// ```
/// use chrono::NaiveDate;
/// use deskpulse_protocol::snapshot_id;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
/// assert_eq!(snapshot_id("weekly", day), "weekly_20240307");
/// ```
pub fn snapshot_id(category: &str, day: NaiveDate) -> String {
    format!("{}_{}", category, day.format("%Y%m%d"))
}

/// Snapshot body: category-specific totals plus named breakdown lists
///
/// Serializes as `{ "totals": {...}, "byGroup": [...], ... }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPayload {
    #[serde(default)]
    pub totals: serde_json::Map<String, serde_json::Value>,
    #[serde(flatten)]
    pub breakdowns: BTreeMap<String, serde_json::Value>,
}

impl SnapshotPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single total
    pub fn with_total(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.totals.insert(key.to_string(), value.into());
        self
    }

    /// Attach a breakdown list (e.g. `byGroup`, `byOrganisation`)
    pub fn with_breakdown(mut self, name: &str, rows: impl Into<serde_json::Value>) -> Self {
        self.breakdowns.insert(name.to_string(), rows.into());
        self
    }

    /// Build a payload from an arbitrary JSON object
    ///
    /// `totals` is taken from the object's `totals` key (must be an object if
    /// present); every other key becomes a breakdown.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ProtocolError> {
        match value {
            serde_json::Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| ProtocolError::InvalidPayload(e.to_string())),
            other => Err(ProtocolError::InvalidPayload(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

/// A persisted snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub snapshot_id: String,
    pub category: SnapshotCategory,
    pub fetched_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: SnapshotPayload,
}

impl Snapshot {
    /// Build the snapshot for `category` on the UTC day of `fetched_at`
    pub fn new(
        category: SnapshotCategory,
        payload: SnapshotPayload,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            snapshot_id: category.snapshot_id(fetched_at.date_naive()),
            category,
            fetched_at,
            payload,
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
