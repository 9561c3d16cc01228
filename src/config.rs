//! Aggregation settings
//!
//! The calendar offset and label locale shared by ingestion and reporting.
//! Settings can come from a JSON file; absent fields keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calendar::{Calendar, Locale, DEFAULT_UTC_OFFSET_MINUTES};
use crate::error::CareError;

/// Largest offset accepted for the device calendar, in minutes
const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareConfig {
    /// Device calendar offset east of UTC
    pub utc_offset_minutes: i32,
    /// Language of chart and trend labels
    pub locale: Locale,
}

impl Default for CareConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            locale: Locale::default(),
        }
    }
}

impl CareConfig {
    pub fn with_utc_offset(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, CareError> {
        let config: CareConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, CareError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), CareError> {
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(CareError::InvalidConfig(format!(
                "utc_offset_minutes must be within ±{MAX_UTC_OFFSET_MINUTES}, got {}",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }

    pub fn calendar(&self) -> Result<Calendar, CareError> {
        self.validate()?;
        Calendar::from_offset_minutes(self.utc_offset_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CareConfig::default();
        assert_eq!(config.utc_offset_minutes, 540);
        assert_eq!(config.locale, Locale::Ko);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CareConfig::from_json(r#"{"locale": "en"}"#).unwrap();
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.utc_offset_minutes, 540);
    }

    #[test]
    fn test_rejects_out_of_range_offset() {
        let err = CareConfig::from_json(r#"{"utc_offset_minutes": 1200}"#).unwrap_err();
        assert!(matches!(err, CareError::InvalidConfig(_)));
        assert!(CareConfig::default().with_utc_offset(-1081).calendar().is_err());
    }
}
