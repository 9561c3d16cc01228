//! Report encoder
//!
//! Assembles the aggregator outputs for one period into a [`RecordReport`].

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::aggregate::{
    compute_period_pattern, compute_time_distribution, period_trend, records_in_window,
};
use crate::calendar::Locale;
use crate::error::CareError;
use crate::types::{AggregationWindow, PeriodKind, RecordReport, ReportProducer, TouchRecord};
use crate::{CORE_VERSION, PRODUCER_NAME};

/// Local ISO format of the report's reference instant
const NOW_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Report encoder
pub struct ReportEncoder {
    instance_id: String,
    locale: Locale,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
            locale: Locale::default(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self {
            instance_id,
            locale: Locale::default(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Build the report for `period` as seen from `now`.
    ///
    /// The totals and distribution cover [`AggregationWindow::current`], the
    /// same days `trend.current` counts, so a record is never "this period" in
    /// one part of the report and "last period" in another. The chart and
    /// trend read the whole working set since their windows reach past it.
    pub fn encode(
        &self,
        records: &[TouchRecord],
        period: PeriodKind,
        now: NaiveDateTime,
    ) -> RecordReport {
        let current = records_in_window(records, AggregationWindow::current(period, now));
        let distribution = compute_time_distribution(&current);
        let pattern = compute_period_pattern(records, period, now, self.locale);
        let trend = period_trend(records, period, now);

        RecordReport {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: CORE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            period,
            now: now.format(NOW_FORMAT).to_string(),
            total_records: current.len(),
            distribution,
            pattern,
            trend_label: trend.classification.label(self.locale).to_string(),
            trend,
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        records: &[TouchRecord],
        period: PeriodKind,
        now: NaiveDateTime,
    ) -> Result<String, CareError> {
        let report = self.encode(records, period, now);
        Ok(serde_json::to_string(&report)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::filter_by_period;
    use crate::calendar::{parse_local_datetime, Calendar};
    use crate::types::TrendClassification;

    fn at(id: &str, local: &str) -> TouchRecord {
        TouchRecord::from_local(id, parse_local_datetime(local).unwrap(), &Calendar::utc())
    }

    fn records() -> Vec<TouchRecord> {
        vec![
            at("1", "2026-02-10T08:00:10"),
            at("2", "2026-02-18T10:45:40"),
            at("3", "2026-02-20T14:00:22"),
            at("4", "2026-02-20T18:30:10"),
        ]
    }

    #[test]
    fn test_week_report() {
        let now = parse_local_datetime("2026-02-20T21:00:00").unwrap();
        let encoder = ReportEncoder::with_instance_id("test".to_string());
        let report = encoder.encode(&records(), PeriodKind::Week, now);

        assert_eq!(report.producer.instance_id, "test");
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.now, "2026-02-20T21:00:00");
        assert_eq!(report.total_records, 3);
        assert_eq!(report.distribution.counts.total(), 3);
        assert_eq!(report.pattern.len(), 7);
        assert_eq!(report.pattern[6].count, 2);
        // 3 this week against 1 the week before
        assert_eq!(report.trend.current, 3);
        assert_eq!(report.trend.previous, 1);
        assert_eq!(report.trend.classification, TrendClassification::Increase);
        assert_eq!(report.trend_label, "증가");
    }

    #[test]
    fn test_totals_follow_the_trend_window() {
        // now - 7d is 2026-02-21: the period filter keeps that day, the
        // current window [02-22, 03-01) does not
        let now = parse_local_datetime("2026-02-28T12:00:00").unwrap();
        let records = vec![at("1", "2026-02-21T10:00:00"), at("2", "2026-02-22T10:00:00")];
        assert_eq!(filter_by_period(&records, PeriodKind::Week, now).len(), 2);

        let report = ReportEncoder::new().encode(&records, PeriodKind::Week, now);
        let pattern_sum: usize = report.pattern.iter().map(|e| e.count).sum();

        assert_eq!(report.total_records, 1);
        assert_eq!(report.distribution.counts.total(), 1);
        assert_eq!(pattern_sum, 1);
        assert_eq!(report.trend.current, 1);
        assert_eq!(report.trend.previous, 1);
    }

    #[test]
    fn test_month_totals_match_trend() {
        let now = parse_local_datetime("2026-02-28T12:00:00").unwrap();
        // the 30-day window starts 01-30; 01-29 is still kept by the period filter
        let records = vec![
            at("1", "2026-01-29T10:00:00"),
            at("2", "2026-01-30T10:00:00"),
            at("3", "2026-02-27T19:00:00"),
        ];

        assert_eq!(filter_by_period(&records, PeriodKind::Month, now).len(), 3);

        let report = ReportEncoder::new().encode(&records, PeriodKind::Month, now);
        assert_eq!(report.total_records, 2);
        assert_eq!(report.trend.current, 2);
        assert_eq!(report.trend.previous, 1);
    }

    #[test]
    fn test_empty_report() {
        let now = parse_local_datetime("2026-02-20T21:00:00").unwrap();
        let report = ReportEncoder::new()
            .with_locale(Locale::En)
            .encode(&[], PeriodKind::Month, now);

        assert_eq!(report.total_records, 0);
        assert_eq!(report.distribution.morning, 0.0);
        assert_eq!(report.pattern.len(), 4);
        assert!(report.pattern.iter().all(|e| e.count == 0));
        assert_eq!(report.trend.classification, TrendClassification::Stable);
        assert_eq!(report.trend_label, "Stable");
    }

    #[test]
    fn test_encode_to_json() {
        let now = parse_local_datetime("2026-02-20T21:00:00").unwrap();
        let json = ReportEncoder::new()
            .encode_to_json(&records(), PeriodKind::Week, now)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["period"], "week");
        assert_eq!(value["trend"]["classification"], "increase");
        assert_eq!(value["distribution"]["counts"]["evening"], 1);
    }
}
