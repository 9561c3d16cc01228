//! touchcare.record.v1 wire shape
//!
//! The app and its record sources exchange touch records as
//! `{ id, date, time, seconds, timestamp }`. The derived strings are optional on
//! input; when present they must agree with `timestamp`.

use serde::{Deserialize, Serialize};

use crate::calendar::{self, Calendar};
use crate::types::TouchRecord;

/// Current record schema version
pub const SCHEMA_VERSION: &str = "touchcare.record.v1";

/// A touch record as received from a record source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTouchRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    pub id: String,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// `HH:mm`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// `SS`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<String>,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl RawTouchRecord {
    /// Raw record carrying only an id and an instant
    pub fn new(id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            schema_version: None,
            id: id.into(),
            date: None,
            time: None,
            seconds: None,
            timestamp,
        }
    }

    /// Attach the derived strings a record source would send
    pub fn with_projection(mut self, date: &str, time: &str, seconds: Option<&str>) -> Self {
        self.date = Some(date.to_string());
        self.time = Some(time.to_string());
        self.seconds = seconds.map(str::to_string);
        self
    }

    /// Validate the record against `calendar`
    pub fn validate(&self, calendar: &Calendar) -> Result<(), ValidationError> {
        self.to_record(calendar).map(|_| ())
    }

    /// Validate and project into a [`TouchRecord`]
    pub fn to_record(&self, calendar: &Calendar) -> Result<TouchRecord, ValidationError> {
        if let Some(version) = &self.schema_version {
            if version != SCHEMA_VERSION {
                return Err(ValidationError::InvalidSchemaVersion {
                    expected: SCHEMA_VERSION.to_string(),
                    actual: version.clone(),
                });
            }
        }

        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }

        let local = calendar
            .local_datetime(self.timestamp)
            .map_err(|_| ValidationError::TimestampOutOfRange {
                id: self.id.clone(),
                timestamp: self.timestamp,
            })?;

        if let Some(date) = &self.date {
            if calendar::parse_date_key(date).is_none() {
                return Err(self.malformed("date", date));
            }
            self.check_consistent("date", date, calendar::date_key(local.date()))?;
        }

        if let Some(time) = &self.time {
            if !calendar::is_time_key(time) {
                return Err(self.malformed("time", time));
            }
            self.check_consistent("time", time, calendar::time_key(local))?;
        }

        if let Some(seconds) = &self.seconds {
            if !calendar::is_seconds_key(seconds) {
                return Err(self.malformed("seconds", seconds));
            }
            self.check_consistent("seconds", seconds, calendar::seconds_key(local))?;
        }

        Ok(TouchRecord::project(
            self.id.clone(),
            self.timestamp,
            local,
            self.seconds.is_some() || self.time.is_none(),
        ))
    }

    fn malformed(&self, field: &'static str, value: &str) -> ValidationError {
        ValidationError::MalformedField {
            id: self.id.clone(),
            field,
            value: value.to_string(),
        }
    }

    fn check_consistent(
        &self,
        field: &'static str,
        actual: &str,
        expected: String,
    ) -> Result<(), ValidationError> {
        if actual == expected {
            Ok(())
        } else {
            Err(ValidationError::InconsistentField {
                id: self.id.clone(),
                field,
                expected,
                actual: actual.to_string(),
            })
        }
    }
}

impl From<&TouchRecord> for RawTouchRecord {
    fn from(record: &TouchRecord) -> Self {
        Self {
            schema_version: None,
            id: record.id().to_string(),
            date: Some(record.date().to_string()),
            time: Some(record.time().to_string()),
            seconds: record.seconds().map(str::to_string),
            timestamp: record.timestamp(),
        }
    }
}

/// Validation errors for raw touch records
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Record id must not be empty")]
    EmptyId,

    #[error("Record {id}: timestamp {timestamp} is out of range")]
    TimestampOutOfRange { id: String, timestamp: i64 },

    #[error("Record {id}: malformed {field} {value:?}")]
    MalformedField {
        id: String,
        field: &'static str,
        value: String,
    },

    #[error("Record {id}: {field} is {actual} but timestamp projects to {expected}")]
    InconsistentField {
        id: String,
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Duplicate record id: {0}")]
    DuplicateId(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_local_datetime;

    fn kst() -> Calendar {
        Calendar::from_offset_minutes(540).unwrap()
    }

    fn raw_at(id: &str, local: &str, calendar: &Calendar) -> RawTouchRecord {
        let local = parse_local_datetime(local).unwrap();
        RawTouchRecord::new(id, calendar.timestamp_millis(local))
    }

    #[test]
    fn test_deserialize_app_shape() {
        let json = r#"{
            "id": "1",
            "date": "2026-01-15",
            "time": "14:30",
            "seconds": "15",
            "timestamp": 1768455015000
        }"#;

        let raw: RawTouchRecord = serde_json::from_str(json).unwrap();
        assert_eq!(raw.id, "1");
        assert_eq!(raw.seconds.as_deref(), Some("15"));

        let record = raw.to_record(&kst()).unwrap();
        assert_eq!(record.date(), "2026-01-15");
        assert_eq!(record.time(), "14:30");
    }

    #[test]
    fn test_projection_fills_missing_strings() {
        let calendar = kst();
        let record = raw_at("7", "2026-02-03T08:45:30", &calendar)
            .to_record(&calendar)
            .unwrap();

        assert_eq!(record.date(), "2026-02-03");
        assert_eq!(record.time(), "08:45");
        assert_eq!(record.seconds(), Some("30"));
    }

    #[test]
    fn test_rejects_inconsistent_date() {
        let calendar = kst();
        let raw = raw_at("7", "2026-02-03T08:45:30", &calendar).with_projection(
            "2026-02-04",
            "08:45",
            Some("30"),
        );

        assert!(matches!(
            raw.validate(&calendar),
            Err(ValidationError::InconsistentField { field: "date", .. })
        ));
    }

    #[test]
    fn test_rejects_unpadded_time() {
        let calendar = kst();
        let raw = raw_at("7", "2026-02-03T08:45:30", &calendar).with_projection(
            "2026-02-03",
            "8:45",
            None,
        );

        assert!(matches!(
            raw.validate(&calendar),
            Err(ValidationError::MalformedField { field: "time", .. })
        ));
    }

    #[test]
    fn test_rejects_empty_id_and_bad_version() {
        let calendar = kst();
        let raw = raw_at(" ", "2026-02-03T08:45:30", &calendar);
        assert_eq!(raw.validate(&calendar), Err(ValidationError::EmptyId));

        let mut raw = raw_at("1", "2026-02-03T08:45:30", &calendar);
        raw.schema_version = Some("touchcare.record.v0".to_string());
        assert!(matches!(
            raw.validate(&calendar),
            Err(ValidationError::InvalidSchemaVersion { .. })
        ));
    }

    #[test]
    fn test_omitted_seconds_stay_omitted() {
        let calendar = kst();
        let record = raw_at("9", "2026-02-03T08:45:30", &calendar)
            .with_projection("2026-02-03", "08:45", None)
            .to_record(&calendar)
            .unwrap();

        assert_eq!(record.seconds(), None);
        let back = RawTouchRecord::from(&record);
        assert_eq!(back.seconds, None);
        assert_eq!(back.date.as_deref(), Some("2026-02-03"));
    }
}
