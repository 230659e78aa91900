//! Parsing of user-supplied `recorded_at` timestamps.
//!
//! Accepted forms, in order of preference:
//!
//! - RFC 3339 with an offset (`2025-03-01T08:30:00+08:00`, `...Z`)
//! - Date and time without an offset, `T` or space separated, seconds and
//!   fractional seconds optional (`2025-03-01T08:30`, `2025-03-01 08:30:15.250`);
//!   read as UTC
//! - A bare date (`2025-03-01`), read as midnight UTC

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// The input matched none of the accepted timestamp forms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("recorded_at must be an ISO 8601 timestamp (got \"{0}\")")]
pub struct TimestampError(pub String);

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp into UTC.
///
/// # Errors
///
/// Returns `TimestampError` if the input is in none of the accepted forms.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, TimestampError> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimestampError(input.to_owned()))
}
