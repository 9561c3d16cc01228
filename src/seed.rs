//! Mock touch records bundled with the app
//!
//! January and February 2026 history used by the record and report screens
//! until a device sync is available.

use crate::calendar::{parse_local_datetime, Calendar};
use crate::error::CareError;
use crate::types::TouchRecord;

/// `(id, local wall time)` of every seed record
const SEED_RECORDS: &[(&str, &str)] = &[
    ("1", "2026-01-15T14:30:15"),
    ("2", "2026-01-15T15:45:32"),
    ("3", "2026-01-15T16:20:48"),
    ("4", "2026-01-16T09:15:05"),
    ("5", "2026-01-16T10:30:22"),
    ("6", "2026-01-18T11:00:10"),
    ("7", "2026-01-18T13:25:55"),
    ("8", "2026-01-18T14:50:18"),
    ("9", "2026-01-18T16:10:42"),
    ("10", "2026-01-20T08:30:30"),
    ("11", "2026-01-20T09:45:12"),
    ("12", "2026-01-20T11:20:25"),
    ("13", "2026-01-20T12:15:38"),
    ("14", "2026-01-20T13:40:50"),
    ("15", "2026-01-20T15:00:03"),
    ("16", "2026-01-20T16:30:27"),
    ("17", "2026-01-20T17:45:41"),
    ("18", "2026-01-20T18:20:16"),
    ("19", "2026-01-20T19:10:59"),
    ("20", "2026-01-20T20:00:08"),
    ("21", "2026-01-22T10:00:33"),
    ("22", "2026-01-22T11:30:47"),
    ("23", "2026-02-01T09:15:20"),
    ("24", "2026-02-01T10:30:45"),
    ("25", "2026-02-01T14:20:12"),
    ("26", "2026-02-03T08:45:30"),
    ("27", "2026-02-03T11:10:55"),
    ("28", "2026-02-03T15:30:18"),
    ("29", "2026-02-03T17:45:42"),
    ("30", "2026-02-05T10:00:05"),
    ("31", "2026-02-05T12:25:33"),
    ("32", "2026-02-05T13:50:27"),
    ("33", "2026-02-05T16:15:50"),
    ("34", "2026-02-07T09:30:15"),
    ("35", "2026-02-07T11:45:38"),
    ("36", "2026-02-07T14:20:22"),
    ("37", "2026-02-10T08:00:10"),
    ("38", "2026-02-10T10:15:25"),
    ("39", "2026-02-10T12:30:40"),
    ("40", "2026-02-10T15:45:55"),
    ("41", "2026-02-10T18:20:08"),
    ("42", "2026-02-12T09:00:30"),
    ("43", "2026-02-12T11:30:45"),
    ("44", "2026-02-12T13:45:20"),
    ("45", "2026-02-15T10:20:15"),
    ("46", "2026-02-15T12:40:35"),
    ("47", "2026-02-15T14:55:50"),
    ("48", "2026-02-15T16:30:12"),
    ("49", "2026-02-18T08:15:25"),
    ("50", "2026-02-18T10:45:40"),
    ("51", "2026-02-18T13:20:18"),
    ("52", "2026-02-20T09:30:33"),
    ("53", "2026-02-20T11:15:47"),
    ("54", "2026-02-20T14:00:22"),
    ("55", "2026-02-20T16:45:55"),
    ("56", "2026-02-20T18:30:10"),
    ("57", "2026-02-22T08:45:28"),
    ("58", "2026-02-22T10:20:42"),
    ("59", "2026-02-25T09:00:15"),
    ("60", "2026-02-25T12:30:38"),
    ("61", "2026-02-25T15:15:52"),
    ("62", "2026-02-28T10:00:25"),
    ("63", "2026-02-28T13:45:40"),
    ("64", "2026-02-28T17:20:18"),
];

/// Number of bundled records
pub fn seed_len() -> usize {
    SEED_RECORDS.len()
}

/// Seed records projected through `calendar`, oldest first
pub fn seed_records(calendar: &Calendar) -> Result<Vec<TouchRecord>, CareError> {
    SEED_RECORDS
        .iter()
        .map(|(id, local)| -> Result<TouchRecord, CareError> {
            Ok(TouchRecord::from_local(*id, parse_local_datetime(local)?, calendar))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{compute_time_distribution, filter_by_period, group_by_date};
    use crate::types::PeriodKind;

    #[test]
    fn test_seed_records_are_consistent() {
        let records = seed_records(&Calendar::default()).unwrap();
        assert_eq!(records.len(), 64);
        assert_eq!(seed_len(), 64);

        let first = &records[0];
        assert_eq!((first.id(), first.date(), first.time()), ("1", "2026-01-15", "14:30"));
        assert_eq!(first.seconds(), Some("15"));
        assert!(records.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
    }

    #[test]
    fn test_seed_february_distribution() {
        let records = seed_records(&Calendar::utc()).unwrap();
        let now = parse_local_datetime("2026-02-28T23:00:00").unwrap();
        let month = filter_by_period(&records, PeriodKind::Month, now);

        // cutoff 2026-01-29: every February record (ids 23..=64)
        assert_eq!(month.len(), 42);
        let dist = compute_time_distribution(&month);
        assert_eq!(dist.unbucketed, 0);
        assert_eq!(dist.counts.total(), 42);
        assert!((dist.morning + dist.afternoon + dist.evening - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_seed_days() {
        let groups = group_by_date(&seed_records(&Calendar::utc()).unwrap());
        assert_eq!(groups[0].date, "2026-02-28");
        assert_eq!(groups[0].records.len(), 3);
        assert_eq!(groups.last().unwrap().date, "2026-01-15");
    }
}
