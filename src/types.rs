//! Core types for TouchCare Core
//!
//! This module defines the records that flow into the aggregator, the summaries
//! it derives, and the session/device state the app keeps between launches.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::calendar::{self, Calendar};
use crate::error::CareError;

/// One logged touch on the device.
///
/// `date`, `time` and `seconds` are projections of `timestamp` through a
/// [`Calendar`]; records are only built by projecting, so the strings can never
/// drift from the instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TouchRecord {
    id: String,
    date: String,
    time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    seconds: Option<String>,
    timestamp: i64,
    #[serde(skip)]
    local: NaiveDateTime,
}

impl TouchRecord {
    /// Build a record from an epoch-millisecond instant
    pub fn from_timestamp(
        id: impl Into<String>,
        timestamp_ms: i64,
        calendar: &Calendar,
    ) -> Result<Self, CareError> {
        let local = calendar.local_datetime(timestamp_ms)?;
        Ok(Self::project(id.into(), timestamp_ms, local, true))
    }

    /// Build a record from a local wall time
    pub fn from_local(id: impl Into<String>, local: NaiveDateTime, calendar: &Calendar) -> Self {
        let timestamp_ms = calendar.timestamp_millis(local);
        Self::project(id.into(), timestamp_ms, local, true)
    }

    pub(crate) fn project(
        id: String,
        timestamp: i64,
        local: NaiveDateTime,
        with_seconds: bool,
    ) -> Self {
        Self {
            id,
            date: calendar::date_key(local.date()),
            time: calendar::time_key(local),
            seconds: with_seconds.then(|| calendar::seconds_key(local)),
            timestamp,
            local,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `YYYY-MM-DD`
    pub fn date(&self) -> &str {
        &self.date
    }

    /// `HH:mm`
    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn seconds(&self) -> Option<&str> {
        self.seconds.as_deref()
    }

    /// Epoch milliseconds
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn local_date(&self) -> NaiveDate {
        self.local.date()
    }

    pub fn local_datetime(&self) -> NaiveDateTime {
        self.local
    }

    pub fn hour(&self) -> u32 {
        self.local.hour()
    }

    /// `YYYY-MM-DD HH:mm:SS`, as shown in the touch log
    pub fn full_date_time(&self) -> String {
        format!(
            "{} {}:{}",
            self.date,
            self.time,
            calendar::seconds_key(self.local)
        )
    }
}

/// Trailing-window granularity used for filtering and charting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Week,
    Month,
}

impl PeriodKind {
    /// Length of the trailing window in days
    pub fn days(&self) -> i64 {
        match self {
            PeriodKind::Week => 7,
            PeriodKind::Month => 30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Week => "week",
            PeriodKind::Month => "month",
        }
    }
}

impl std::str::FromStr for PeriodKind {
    type Err = CareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(PeriodKind::Week),
            "month" => Ok(PeriodKind::Month),
            other => Err(CareError::InvalidPeriod(other.to_string())),
        }
    }
}

/// Half-open date interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AggregationWindow {
    /// Trailing window of `period.days()` calendar days ending with `now`'s date
    pub fn current(period: PeriodKind, now: NaiveDateTime) -> Self {
        let end = now.date() + Duration::days(1);
        Self {
            start: end - Duration::days(period.days()),
            end,
        }
    }

    /// Window of equal length immediately before [`AggregationWindow::current`]
    pub fn previous(period: PeriodKind, now: NaiveDateTime) -> Self {
        let current = Self::current(period, now);
        Self {
            start: current.start - Duration::days(period.days()),
            end: current.start,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Time-of-day bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    /// `[06, 12)`
    Morning,
    /// `[12, 18)`
    Afternoon,
    /// `[18, 24)`
    Evening,
}

impl TimeBucket {
    /// Bucket for an hour of day; hours before 06 have none
    pub fn for_hour(hour: u32) -> Option<Self> {
        match hour {
            6..=11 => Some(TimeBucket::Morning),
            12..=17 => Some(TimeBucket::Afternoon),
            18..=23 => Some(TimeBucket::Evening),
            _ => None,
        }
    }
}

/// Integer counts per time-of-day bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCounts {
    pub morning: usize,
    pub afternoon: usize,
    pub evening: usize,
}

impl BucketCounts {
    pub fn total(&self) -> usize {
        self.morning + self.afternoon + self.evening
    }

    pub fn get(&self, bucket: TimeBucket) -> usize {
        match bucket {
            TimeBucket::Morning => self.morning,
            TimeBucket::Afternoon => self.afternoon,
            TimeBucket::Evening => self.evening,
        }
    }

    pub(crate) fn increment(&mut self, bucket: TimeBucket) {
        match bucket {
            TimeBucket::Morning => self.morning += 1,
            TimeBucket::Afternoon => self.afternoon += 1,
            TimeBucket::Evening => self.evening += 1,
        }
    }
}

/// Proportional breakdown of records across the time-of-day buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeDistribution {
    /// Morning share (percentage, 0-100)
    pub morning: f64,
    /// Afternoon share (percentage, 0-100)
    pub afternoon: f64,
    /// Evening share (percentage, 0-100)
    pub evening: f64,
    pub counts: BucketCounts,
    /// Records before 06:00, outside every bucket and the denominator
    pub unbucketed: usize,
}

impl TimeDistribution {
    /// Copy with percentages rounded to two decimals for display
    pub fn rounded(&self) -> Self {
        let round = |v: f64| (v * 100.0).round() / 100.0;
        Self {
            morning: round(self.morning),
            afternoon: round(self.afternoon),
            evening: round(self.evening),
            ..*self
        }
    }

    pub fn percentage(&self, bucket: TimeBucket) -> f64 {
        match bucket {
            TimeBucket::Morning => self.morning,
            TimeBucket::Afternoon => self.afternoon,
            TimeBucket::Evening => self.evening,
        }
    }
}

/// One bar of the period chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEntry {
    /// Weekday name (week mode) or `MM/DD` window start (month mode)
    pub label: String,
    /// Day (week mode) or first day of the window (month mode), `YYYY-MM-DD`
    pub date: String,
    /// Last day of the window, inclusive (month mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub count: usize,
}

/// Coarse period-over-period activity label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendClassification {
    Increase,
    Stable,
    Observe,
}

impl TrendClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendClassification::Increase => "increase",
            TrendClassification::Stable => "stable",
            TrendClassification::Observe => "observe",
        }
    }

    pub fn label(&self, locale: calendar::Locale) -> &'static str {
        match (locale, self) {
            (calendar::Locale::Ko, TrendClassification::Increase) => "증가",
            (calendar::Locale::Ko, TrendClassification::Stable) => "안정",
            (calendar::Locale::Ko, TrendClassification::Observe) => "관찰 필요",
            (calendar::Locale::En, TrendClassification::Increase) => "Increase",
            (calendar::Locale::En, TrendClassification::Stable) => "Stable",
            (calendar::Locale::En, TrendClassification::Observe) => "Observe",
        }
    }
}

/// Counts of two consecutive windows and their classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub current: usize,
    pub previous: usize,
    pub classification: TrendClassification,
}

/// Records of a single calendar day, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRecords {
    pub date: String,
    pub records: Vec<TouchRecord>,
}

/// Report producer metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Report screen payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordReport {
    pub producer: ReportProducer,
    pub period: PeriodKind,
    /// Reference instant, local ISO 8601
    pub now: String,
    /// Records inside the current trailing window
    pub total_records: usize,
    pub distribution: TimeDistribution,
    pub pattern: Vec<PatternEntry>,
    pub trend: TrendSummary,
    /// Localized trend label
    pub trend_label: String,
}

/// Icon set used to render a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IconType {
    MaterialIcons,
    Ionicons,
}

/// A paired touch device, in the camelCase shape the app persists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub mac_address: String,
    pub icon: String,
    pub icon_type: IconType,
    pub is_connected: bool,
    /// When the device was registered; the catalog writes `""` for "never"
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub added_at: Option<DateTime<Utc>>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
    }
}

/// Signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}
