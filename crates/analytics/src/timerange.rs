//! Date range parsing and calendar helpers
//!
//! Ranges are inclusive on both ends. Day boundaries are UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// An inclusive time window for metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start of the range (inclusive)
    pub start: DateTime<Utc>,
    /// End of the range (inclusive)
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Create a new range
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(AnalyticsError::InvalidTimeRange(
                "end must be after start".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Whole calendar days: start of `from` to end of `to`
    pub fn from_dates(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        Self::new(start_of_day_naive(from), end_of_day_naive(to))
    }

    /// Parse a custom range: `2024-01-01,2024-01-31`
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(',').collect();
        if parts.len() != 2 {
            return Err(AnalyticsError::InvalidTimeRange(format!(
                "expected 'YYYY-MM-DD,YYYY-MM-DD', got: {}",
                s
            )));
        }

        let from = parse_date(parts[0].trim())?;
        let to = parse_date(parts[1].trim())?;
        Self::from_dates(from, to)
    }

    /// Monday 00:00:00 to Sunday 23:59:59.999999999 of the week containing `date`
    pub fn week_containing(date: NaiveDate) -> Self {
        let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
        let sunday = monday + Duration::days(6);
        Self {
            start: start_of_day_naive(monday),
            end: end_of_day_naive(sunday),
        }
    }

    /// The last full week before the week containing `now`
    pub fn previous_week(now: DateTime<Utc>) -> Self {
        Self::week_containing(now.date_naive() - Duration::days(7))
    }

    /// Whether `ts` falls inside the range (both ends inclusive)
    #[inline]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// Number of calendar days touched by the range
    ///
    /// Jan 1 to Jan 7 returns 7 (both endpoints included).
    pub fn days(&self) -> i64 {
        (self.end.date_naive() - self.start.date_naive()).num_days() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{}",
            self.start.date_naive().format("%Y-%m-%d"),
            self.end.date_naive().format("%Y-%m-%d")
        )
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        AnalyticsError::InvalidTimeRange(format!("invalid date format: {} (use YYYY-MM-DD)", s))
    })
}

/// Midnight UTC at the start of `date`
pub fn start_of_day_naive(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Last representable instant of `date` in UTC
pub fn end_of_day_naive(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_nano_opt(23, 59, 59, 999_999_999)
        .map(|t| t.and_utc())
        .unwrap_or_else(|| start_of_day_naive(date) + Duration::days(1) - Duration::nanoseconds(1))
}

/// January 1st, 00:00:00 UTC of the year containing `dt`
pub fn start_of_year(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive()
        .with_month(1)
        .and_then(|d| d.with_day(1))
        .map(start_of_day_naive)
        .unwrap_or(dt)
}
