//! Local calendar projection
//!
//! Every `date`/`time`/`seconds` string in the crate is produced here. Records
//! carry no timezone; a working set is projected through one fixed offset, so
//! zero-padded `YYYY-MM-DD` keys order the same way as the dates they name.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::CareError;

/// Format of a calendar date key
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format of an hour:minute key
pub const TIME_FORMAT: &str = "%H:%M";

/// Format of the seconds component
pub const SECONDS_FORMAT: &str = "%S";

/// Default offset for the device calendar (KST, UTC+09:00)
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 9 * 60;

/// Label language for weekday names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ko,
    En,
}

impl Locale {
    /// Short weekday name
    pub fn weekday_label(&self, weekday: Weekday) -> &'static str {
        match self {
            Locale::Ko => match weekday {
                Weekday::Mon => "월",
                Weekday::Tue => "화",
                Weekday::Wed => "수",
                Weekday::Thu => "목",
                Weekday::Fri => "금",
                Weekday::Sat => "토",
                Weekday::Sun => "일",
            },
            Locale::En => match weekday {
                Weekday::Mon => "Mon",
                Weekday::Tue => "Tue",
                Weekday::Wed => "Wed",
                Weekday::Thu => "Thu",
                Weekday::Fri => "Fri",
                Weekday::Sat => "Sat",
                Weekday::Sun => "Sun",
            },
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = CareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ko" | "ko-kr" => Ok(Locale::Ko),
            "en" | "en-us" => Ok(Locale::En),
            other => Err(CareError::InvalidConfig(format!("unsupported locale: {other}"))),
        }
    }
}

/// Fixed-offset calendar used to project epoch milliseconds to local wall time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::from_offset_minutes(DEFAULT_UTC_OFFSET_MINUTES)
            .unwrap_or_else(|_| Self::utc())
    }
}

impl Calendar {
    /// UTC calendar
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Calendar east of UTC by the given number of minutes
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, CareError> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
            .ok_or_else(|| CareError::InvalidConfig(format!("UTC offset out of range: {minutes} minutes")))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Project epoch milliseconds to local wall time
    pub fn local_datetime(&self, timestamp_ms: i64) -> Result<NaiveDateTime, CareError> {
        DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
            .map(|utc| utc.with_timezone(&self.offset).naive_local())
            .ok_or(CareError::InvalidTimestamp(timestamp_ms))
    }

    /// Epoch milliseconds of a local wall time
    pub fn timestamp_millis(&self, local: NaiveDateTime) -> i64 {
        local.and_utc().timestamp_millis() - i64::from(self.offset.local_minus_utc()) * 1000
    }

    /// Current local wall time
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset).naive_local()
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn time_key(local: NaiveDateTime) -> String {
    local.format(TIME_FORMAT).to_string()
}

pub fn seconds_key(local: NaiveDateTime) -> String {
    local.format(SECONDS_FORMAT).to_string()
}

/// `MM/DD` label for a window start
pub fn short_date_label(date: NaiveDate) -> String {
    format!("{:02}/{:02}", date.month(), date.day())
}

/// Parse a strict, zero-padded `YYYY-MM-DD` key
pub fn parse_date_key(s: &str) -> Option<NaiveDate> {
    if s.len() != 10 || !is_zero_padded(s, &[4, 7], '-') {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Parse a local wall time such as `2026-02-20T09:30:15` or `2026-02-20 09:30`
pub fn parse_local_datetime(s: &str) -> Result<NaiveDateTime, CareError> {
    let s = s.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    if let Some(date) = parse_date_key(s) {
        if let Some(dt) = date.and_hms_opt(23, 59, 59) {
            return Ok(dt);
        }
    }
    Err(CareError::ParseError(format!("invalid local date-time: {s}")))
}

/// Every char is an ASCII digit except `sep` at the given byte positions
fn is_zero_padded(s: &str, sep_positions: &[usize], sep: char) -> bool {
    s.char_indices().all(|(i, c)| {
        if sep_positions.contains(&i) {
            c == sep
        } else {
            c.is_ascii_digit()
        }
    })
}

/// Strict `HH:mm` check
pub fn is_time_key(s: &str) -> bool {
    s.len() == 5 && is_zero_padded(s, &[2], ':')
}

/// Strict two-digit seconds check
pub fn is_seconds_key(s: &str) -> bool {
    s.len() == 2 && s.chars().all(|c| c.is_ascii_digit())
}
