//! Pipeline orchestration
//!
//! This module provides the public API for TouchCare Core.
//! It orchestrates ingestion, aggregation and report encoding from raw record
//! JSON to report JSON.

use chrono::NaiveDateTime;

use crate::aggregate;
use crate::calendar::Calendar;
use crate::config::CareConfig;
use crate::error::CareError;
use crate::report::ReportEncoder;
use crate::schema::{sort_chronological, RawTouchRecord, RecordAdapter, ValidationError};
use crate::types::{PeriodKind, RecordReport, TouchRecord};

/// Convert a JSON array of touch records into report JSON (stateless, one-shot).
///
/// # Arguments
/// * `records_json` - JSON array in the `touchcare.record.v1` shape
/// * `period` - Trailing window to report on
/// * `now` - Reference local wall time
/// * `config` - Calendar offset and label locale
///
/// # Example
/// ```ignore
/// let report_json = records_to_report(records_json, PeriodKind::Week, now, &CareConfig::default())?;
/// ```
pub fn records_to_report(
    records_json: &str,
    period: PeriodKind,
    now: NaiveDateTime,
    config: &CareConfig,
) -> Result<String, CareError> {
    // Stage 1: Parse and validate records
    let calendar = config.calendar()?;
    let raw = RecordAdapter::parse_array(records_json)?;
    let records = RecordAdapter::to_records(&raw, &calendar)?;

    // Stage 2: Aggregate and encode
    let encoder = ReportEncoder::new().with_locale(config.locale);
    encoder.encode_to_json(&records, period, now)
}

/// Stateful processor holding a working set of records.
///
/// Use this when the host keeps records across screens: the log view, deletes
/// and repeated reports all operate on the same set.
pub struct RecordProcessor {
    calendar: Calendar,
    encoder: ReportEncoder,
    records: Vec<TouchRecord>,
}

impl Default for RecordProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordProcessor {
    /// Create a processor with default settings (KST calendar, Korean labels)
    pub fn new() -> Self {
        Self {
            calendar: Calendar::default(),
            encoder: ReportEncoder::new(),
            records: Vec::new(),
        }
    }

    /// Create a processor with explicit settings
    pub fn with_config(config: &CareConfig) -> Result<Self, CareError> {
        Ok(Self {
            calendar: config.calendar()?,
            encoder: ReportEncoder::new().with_locale(config.locale),
            records: Vec::new(),
        })
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Replace the working set with the records in a JSON array
    pub fn load_json(&mut self, records_json: &str) -> Result<usize, CareError> {
        let raw = RecordAdapter::parse_array(records_json)?;
        self.load_raw(&raw)
    }

    /// Replace the working set with parsed records, validated once under this
    /// processor's calendar
    pub fn load_raw(&mut self, raw: &[RawTouchRecord]) -> Result<usize, CareError> {
        self.records = RecordAdapter::to_records(raw, &self.calendar)?;
        Ok(self.records.len())
    }

    /// Replace the working set with already-validated records
    pub fn load_records(&mut self, records: Vec<TouchRecord>) -> Result<usize, CareError> {
        let raw: Vec<RawTouchRecord> = records.iter().map(RawTouchRecord::from).collect();
        self.records = RecordAdapter::to_records(&raw, &self.calendar)?;
        Ok(self.records.len())
    }

    /// Append one record; its id must be new to the working set
    pub fn push(&mut self, record: TouchRecord) -> Result<(), CareError> {
        if self.records.iter().any(|r| r.id() == record.id()) {
            return Err(ValidationError::DuplicateId(record.id().to_string()).into());
        }
        self.records.push(record);
        sort_chronological(&mut self.records);
        Ok(())
    }

    /// Remove a record by id; returns whether one was removed
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records = aggregate::delete_record(&self.records, id);
        let removed = self.records.len() < before;
        log::debug!("delete record {id}: removed={removed}");
        removed
    }

    /// Working set, oldest first
    pub fn records(&self) -> &[TouchRecord] {
        &self.records
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Report for `period` as seen from `now`
    pub fn report(&self, period: PeriodKind, now: NaiveDateTime) -> RecordReport {
        self.encoder.encode(&self.records, period, now)
    }

    /// Report for `period` as seen from the calendar's current time
    pub fn report_now(&self, period: PeriodKind) -> RecordReport {
        self.report(period, self.calendar.now())
    }

    pub fn report_json(&self, period: PeriodKind, now: NaiveDateTime) -> Result<String, CareError> {
        self.encoder.encode_to_json(&self.records, period, now)
    }

    /// Serialize the working set for persistence
    pub fn save_records(&self) -> Result<String, CareError> {
        Ok(serde_json::to_string(&self.records)?)
    }

    /// Drop every record
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
