//! Adapter for converting raw records into a validated working set

use std::collections::HashSet;

use crate::calendar::Calendar;
use crate::error::CareError;
use crate::schema::raw_record::{RawTouchRecord, ValidationError};
use crate::types::TouchRecord;

/// Adapter for converting raw records to [`TouchRecord`]s
pub struct RecordAdapter;

impl RecordAdapter {
    /// Parse a JSON string containing an array of raw records
    pub fn parse_array(json: &str) -> Result<Vec<RawTouchRecord>, CareError> {
        let records: Vec<RawTouchRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON) containing raw records
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawTouchRecord>, CareError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawTouchRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(CareError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Validate raw records and project them through `calendar`.
    ///
    /// Fails on the first invalid record or repeated id. The result is sorted
    /// by `(timestamp, id)`.
    pub fn to_records(
        raw: &[RawTouchRecord],
        calendar: &Calendar,
    ) -> Result<Vec<TouchRecord>, CareError> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(raw.len());
        let mut records = Vec::with_capacity(raw.len());

        for item in raw {
            if !seen.insert(item.id.as_str()) {
                return Err(ValidationError::DuplicateId(item.id.clone()).into());
            }
            records.push(item.to_record(calendar)?);
        }

        sort_chronological(&mut records);
        log::debug!("ingested {} touch records", records.len());
        Ok(records)
    }

    /// Validate a batch of records, returning only the failures
    pub fn validate_records(raw: &[RawTouchRecord], calendar: &Calendar) -> Vec<ValidationResult> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(raw.len());

        raw.iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let result = if !seen.insert(item.id.as_str()) {
                    Err(ValidationError::DuplicateId(item.id.clone()))
                } else {
                    item.validate(calendar)
                };
                result.err().map(|error| ValidationResult {
                    index,
                    record_id: item.id.clone(),
                    error,
                })
            })
            .collect()
    }
}

/// Sort by `(timestamp, id)`, oldest first
pub fn sort_chronological(records: &mut [TouchRecord]) {
    records.sort_by(|a, b| {
        a.timestamp()
            .cmp(&b.timestamp())
            .then_with(|| a.id().cmp(b.id()))
    });
}

/// Result of record validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub index: usize,
    pub record_id: String,
    pub error: ValidationError,
}
