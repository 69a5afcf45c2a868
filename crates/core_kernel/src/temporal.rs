//! Datetime reconciliation between the CRM and local storage
//!
//! The CRM reads dates back as `2020-01-05 10:30:00` (space separator), and
//! occasionally as raw Unix timestamps. Local storage expects ISO-style
//! values with a `T` marker: `2020-01-05T10:30:00`. The CRM accepts the local
//! storage format on write, so the two directions are asymmetric:
//!
//! - load: [`normalize_crm_datetime`] rewrites CRM values into storage format
//! - save: [`format_storage_datetime`] / [`format_storage_date`] render typed values

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use std::str::FromStr;

/// Local storage format for datetime values
pub const DATETIME_STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Local storage format for date-only values
pub const DATE_STORAGE_FORMAT: &str = "%Y-%m-%d";

/// Timezone wrapper for the site the bridge serves
///
/// Numeric timestamps coming back from the CRM are interpreted in this
/// timezone. Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Tz::from_str(&s)
            .map(Timezone)
            .map_err(|_| serde::de::Error::custom(format!("Invalid timezone: {}", s)))
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Converts a Unix timestamp to the local wall-clock time
    pub fn from_timestamp(&self, secs: i64) -> Result<NaiveDateTime, TemporalError> {
        DateTime::from_timestamp(secs, 0)
            .map(|utc| utc.with_timezone(&self.0).naive_local())
            .ok_or(TemporalError::TimestampOutOfRange(secs))
    }

    /// Converts a local wall-clock time to a Unix timestamp
    ///
    /// Ambiguous times (DST fold) resolve to the earliest instant. Times that
    /// fall into a DST gap do not exist locally and are rejected.
    pub fn to_timestamp(&self, local: NaiveDateTime) -> Result<i64, TemporalError> {
        local
            .and_local_timezone(self.0)
            .earliest()
            .map(|dt| dt.timestamp())
            .ok_or_else(|| TemporalError::NonexistentLocalTime(local.to_string()))
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

/// Errors related to datetime reconciliation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Timestamp {0} is out of range")]
    TimestampOutOfRange(i64),

    #[error("Local time {0} does not exist in the configured timezone")]
    NonexistentLocalTime(String),

    #[error("Unparseable datetime value: {0}")]
    Unparseable(String),
}

/// Rewrites a CRM datetime value into the local storage format
///
/// Numeric input is a Unix timestamp and is rendered in the given timezone.
/// Anything else is a CRM-formatted date string whose space separators are
/// replaced by the `T` marker. Values already in storage format pass through
/// unchanged, so normalizing twice never double-converts.
pub fn normalize_crm_datetime(raw: &str, tz: &Timezone) -> Result<String, TemporalError> {
    match parse_numeric(raw) {
        Some(secs) => Ok(format_storage_datetime(&tz.from_timestamp(secs)?)),
        None => Ok(raw.replace(' ', "T")),
    }
}

/// Renders a datetime in the local storage format
pub fn format_storage_datetime(value: &NaiveDateTime) -> String {
    value.format(DATETIME_STORAGE_FORMAT).to_string()
}

/// Renders a date in the local storage format
pub fn format_storage_date(value: &NaiveDate) -> String {
    value.format(DATE_STORAGE_FORMAT).to_string()
}

/// Parses a storage-format datetime
///
/// Also accepts fractional seconds, minute precision, and a bare date
/// (taken as midnight).
pub fn parse_storage_datetime(value: &str) -> Result<NaiveDateTime, TemporalError> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, DATETIME_STORAGE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_STORAGE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| TemporalError::Unparseable(value.to_string()))
}

/// Parses a storage-format date, dropping any time component
pub fn parse_storage_date(value: &str) -> Result<NaiveDate, TemporalError> {
    NaiveDate::parse_from_str(value.trim(), DATE_STORAGE_FORMAT)
        .or_else(|_| parse_storage_datetime(value).map(|dt| dt.date()))
}

/// Numeric strings are timestamps; fractional seconds are truncated
fn parse_numeric(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f.trunc() as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap()
    }

    #[test]
    fn test_space_separator_becomes_t_marker() {
        let tz = Timezone::default();
        assert_eq!(
            normalize_crm_datetime("2020-01-05 10:30:00", &tz).unwrap(),
            "2020-01-05T10:30:00"
        );
    }

    #[test]
    fn test_storage_format_is_left_alone() {
        let tz = Timezone::default();
        assert_eq!(
            normalize_crm_datetime("2020-01-05T10:30:00", &tz).unwrap(),
            "2020-01-05T10:30:00"
        );
        assert_eq!(normalize_crm_datetime("2020-01-05", &tz).unwrap(), "2020-01-05");
    }

    #[test]
    fn test_numeric_is_a_timestamp() {
        let tz = Timezone::default();
        assert_eq!(
            normalize_crm_datetime("1578220200", &tz).unwrap(),
            "2020-01-05T10:30:00"
        );
        assert_eq!(
            normalize_crm_datetime("1578220200.75", &tz).unwrap(),
            "2020-01-05T10:30:00"
        );
    }

    #[test]
    fn test_numeric_timestamp_uses_configured_timezone() {
        let tz = Timezone::new(chrono_tz::Europe::Berlin);
        assert_eq!(
            normalize_crm_datetime("1578220200", &tz).unwrap(),
            "2020-01-05T11:30:00"
        );
    }

    #[test]
    fn test_to_timestamp_inverts_from_timestamp() {
        let tz = Timezone::new(chrono_tz::America::New_York);
        let local = tz.from_timestamp(1_578_220_200).unwrap();
        assert_eq!(tz.to_timestamp(local).unwrap(), 1_578_220_200);
    }

    #[test]
    fn test_nonexistent_local_time() {
        let tz = Timezone::new(chrono_tz::America::New_York);
        let in_gap = dt(2024, 3, 10, 2, 30, 0);
        assert!(matches!(
            tz.to_timestamp(in_gap),
            Err(TemporalError::NonexistentLocalTime(_))
        ));
    }

    #[test]
    fn test_parse_storage_datetime_variants() {
        assert_eq!(parse_storage_datetime("2020-01-05T10:30:00").unwrap(), dt(2020, 1, 5, 10, 30, 0));
        assert_eq!(parse_storage_datetime("2020-01-05T10:30").unwrap(), dt(2020, 1, 5, 10, 30, 0));
        assert_eq!(parse_storage_datetime("2020-01-05").unwrap(), dt(2020, 1, 5, 0, 0, 0));
        assert!(parse_storage_datetime("10:30:00").is_err());
    }

    #[test]
    fn test_parse_storage_date_drops_time() {
        assert_eq!(
            parse_storage_date("2020-01-05T10:30:00").unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 5).unwrap()
        );
    }

    #[test]
    fn test_timezone_serde() {
        let tz: Timezone = serde_json::from_str("\"Europe/Paris\"").unwrap();
        assert_eq!(tz, Timezone::new(chrono_tz::Europe::Paris));
        assert!(serde_json::from_str::<Timezone>("\"Mars/Olympus\"").is_err());
    }
}
