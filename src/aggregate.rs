//! Record aggregation
//!
//! Pure functions over a record list and a reference "now": period filtering,
//! time-of-day distribution, the period chart, trend classification and the
//! browsing helpers used by the log and record screens. None of them fail;
//! malformed input is rejected earlier by [`crate::schema::RecordAdapter`].

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::calendar::{self, Locale};
use crate::types::{
    AggregationWindow, BucketCounts, DayRecords, PatternEntry, PeriodKind, TimeBucket,
    TimeDistribution, TouchRecord, TrendClassification, TrendSummary,
};

/// Number of 7-day windows in the month chart
const MONTH_PATTERN_WINDOWS: i64 = 4;

/// Records dated on or after `now - period.days()`, in input order
pub fn filter_by_period(
    records: &[TouchRecord],
    period: PeriodKind,
    now: NaiveDateTime,
) -> Vec<TouchRecord> {
    let cutoff = (now - Duration::days(period.days())).date();
    records
        .iter()
        .filter(|r| r.local_date() >= cutoff)
        .cloned()
        .collect()
}

/// Records dated inside `window`, in input order
pub fn records_in_window(records: &[TouchRecord], window: AggregationWindow) -> Vec<TouchRecord> {
    records
        .iter()
        .filter(|r| window.contains(r.local_date()))
        .cloned()
        .collect()
}

/// Morning / afternoon / evening breakdown.
///
/// Percentages are derived from the final integer counts; records before 06:00
/// are counted in `unbucketed` only.
pub fn compute_time_distribution(records: &[TouchRecord]) -> TimeDistribution {
    let mut counts = BucketCounts::default();
    let mut unbucketed = 0;

    for record in records {
        match TimeBucket::for_hour(record.hour()) {
            Some(bucket) => counts.increment(bucket),
            None => unbucketed += 1,
        }
    }

    let total = counts.total();
    let share = |count: usize| {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64 * 100.0
        }
    };

    TimeDistribution {
        morning: share(counts.morning),
        afternoon: share(counts.afternoon),
        evening: share(counts.evening),
        counts,
        unbucketed,
    }
}

/// Chart series for the period screen.
///
/// Week: seven days ending with `now`'s date, oldest first, labelled with the
/// weekday name. Month: four contiguous 7-day windows ending `now`, `now-7d`,
/// `now-14d` and `now-21d`, oldest first, labelled `MM/DD` of the window start.
pub fn compute_period_pattern(
    records: &[TouchRecord],
    period: PeriodKind,
    now: NaiveDateTime,
    locale: Locale,
) -> Vec<PatternEntry> {
    let today = now.date();

    match period {
        PeriodKind::Week => (0..7)
            .rev()
            .map(|offset| {
                let day = today - Duration::days(offset);
                PatternEntry {
                    label: locale.weekday_label(day.weekday()).to_string(),
                    date: calendar::date_key(day),
                    end_date: None,
                    count: count_between(records, day, day),
                }
            })
            .collect(),
        PeriodKind::Month => (0..MONTH_PATTERN_WINDOWS)
            .rev()
            .map(|window| {
                let end = today - Duration::days(7 * window);
                let start = end - Duration::days(6);
                PatternEntry {
                    label: calendar::short_date_label(start),
                    date: calendar::date_key(start),
                    end_date: Some(calendar::date_key(end)),
                    count: count_between(records, start, end),
                }
            })
            .collect(),
    }
}

/// Records dated within `[start, end]`
fn count_between(records: &[TouchRecord], start: NaiveDate, end: NaiveDate) -> usize {
    records
        .iter()
        .filter(|r| {
            let date = r.local_date();
            start <= date && date <= end
        })
        .count()
}

/// Classify `current` against `previous`.
///
/// `increase` above 120% of `previous`, `stable` from 80%, `observe` below.
/// Compared in integers (`5c > 6p`, `5c >= 4p`) so the thresholds are exact.
pub fn compute_trend(current: usize, previous: usize) -> TrendClassification {
    let current = current as u128 * 5;
    let previous = previous as u128;

    if current > previous * 6 {
        TrendClassification::Increase
    } else if current >= previous * 4 {
        TrendClassification::Stable
    } else {
        TrendClassification::Observe
    }
}

/// Trend of the current trailing window against the one before it
pub fn period_trend(records: &[TouchRecord], period: PeriodKind, now: NaiveDateTime) -> TrendSummary {
    let current_window = AggregationWindow::current(period, now);
    let previous_window = AggregationWindow::previous(period, now);

    let mut current = 0;
    let mut previous = 0;
    for record in records {
        let date = record.local_date();
        if current_window.contains(date) {
            current += 1;
        } else if previous_window.contains(date) {
            previous += 1;
        }
    }

    TrendSummary {
        current,
        previous,
        classification: compute_trend(current, previous),
    }
}

/// Working set without the first record whose id is `id`
pub fn delete_record(records: &[TouchRecord], id: &str) -> Vec<TouchRecord> {
    let mut remaining = records.to_vec();
    if let Some(pos) = remaining.iter().position(|r| r.id() == id) {
        remaining.remove(pos);
    }
    remaining
}

/// Newest first; equal timestamps ordered by id
pub fn sort_latest_first(records: &[TouchRecord]) -> Vec<TouchRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        b.timestamp()
            .cmp(&a.timestamp())
            .then_with(|| a.id().cmp(b.id()))
    });
    sorted
}

/// Per-day groups, newest day first, each newest first
pub fn group_by_date(records: &[TouchRecord]) -> Vec<DayRecords> {
    let mut by_date: BTreeMap<String, Vec<TouchRecord>> = BTreeMap::new();
    for record in sort_latest_first(records) {
        by_date
            .entry(record.date().to_string())
            .or_default()
            .push(record);
    }

    by_date
        .into_iter()
        .rev()
        .map(|(date, records)| DayRecords { date, records })
        .collect()
}

/// Records of one `YYYY-MM-DD` day, newest first
pub fn records_on(records: &[TouchRecord], date: &str) -> Vec<TouchRecord> {
    sort_latest_first(records)
        .into_iter()
        .filter(|r| r.date() == date)
        .collect()
}
