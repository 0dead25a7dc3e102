//! Boundary validation for hand-entered engineer hours
//!
//! Input arrives as untyped JSON from a form. `validate_engineer_hours`
//! returns `None` for anything malformed so callers can show a validation
//! message without an error path; `parse_engineer_hours` carries the reason.

use serde_json::Value;

use crate::error::{AnalyticsError, Result};
use crate::metrics::EngineerHoursInput;

/// Validate and normalize engineer-hours input, discarding the reason
pub fn validate_engineer_hours(value: &Value) -> Option<EngineerHoursInput> {
    parse_engineer_hours(value).ok()
}

/// Validate and normalize engineer-hours input
///
/// Rejects non-objects, blank names, negative or non-finite hours and blank
/// snapshot ids. String fields are trimmed.
pub fn parse_engineer_hours(value: &Value) -> Result<EngineerHoursInput> {
    let Value::Object(map) = value else {
        return Err(invalid("input must be an object"));
    };

    let engineer_name = map
        .get("engineerName")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid("engineerName must be a non-empty string"))?;

    let total_hours_worked = map
        .get("totalHoursWorked")
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid("totalHoursWorked must be a number"))?;
    if !total_hours_worked.is_finite() || total_hours_worked < 0.0 {
        return Err(invalid("totalHoursWorked must be zero or positive"));
    }

    let week_snapshot_id = map
        .get("weekSnapshotId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid("weekSnapshotId must be a non-empty string"))?;

    Ok(EngineerHoursInput {
        engineer_name: engineer_name.to_string(),
        total_hours_worked,
        week_snapshot_id: week_snapshot_id.to_string(),
    })
}

fn invalid(message: &str) -> AnalyticsError {
    AnalyticsError::InvalidInput(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_input_is_trimmed() {
        let input = validate_engineer_hours(&json!({
            "engineerName": "  Dana Ortiz ",
            "totalHoursWorked": 37.5,
            "weekSnapshotId": " weekly_20240304 "
        }))
        .unwrap();

        assert_eq!(input.engineer_name, "Dana Ortiz");
        assert_eq!(input.total_hours_worked, 37.5);
        assert_eq!(input.week_snapshot_id, "weekly_20240304");
    }

    #[test]
    fn test_zero_hours_accepted() {
        let input = validate_engineer_hours(&json!({
            "engineerName": "Sam",
            "totalHoursWorked": 0,
            "weekSnapshotId": "weekly_20240304"
        }));
        assert!(input.is_some());
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(validate_engineer_hours(&json!("Dana")).is_none());
        assert!(validate_engineer_hours(&json!([1, 2])).is_none());
        assert!(validate_engineer_hours(&Value::Null).is_none());
    }

    #[test]
    fn test_rejects_blank_name() {
        let value = json!({
            "engineerName": "   ",
            "totalHoursWorked": 10,
            "weekSnapshotId": "weekly_20240304"
        });
        assert!(validate_engineer_hours(&value).is_none());
    }

    #[test]
    fn test_rejects_negative_hours() {
        let value = json!({
            "engineerName": "Sam",
            "totalHoursWorked": -1,
            "weekSnapshotId": "weekly_20240304"
        });
        let err = parse_engineer_hours(&value).unwrap_err();
        assert!(err.to_string().contains("totalHoursWorked"));
    }

    #[test]
    fn test_rejects_string_hours() {
        let value = json!({
            "engineerName": "Sam",
            "totalHoursWorked": "40",
            "weekSnapshotId": "weekly_20240304"
        });
        assert!(validate_engineer_hours(&value).is_none());
    }

    #[test]
    fn test_rejects_empty_snapshot_id() {
        let value = json!({
            "engineerName": "Sam",
            "totalHoursWorked": 40,
            "weekSnapshotId": ""
        });
        assert!(validate_engineer_hours(&value).is_none());
    }
}
