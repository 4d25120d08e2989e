//! Day-month-year date strings.
//!
//! Dates cross the storage boundary as text: `DD-MM-YYYY` for birth dates and
//! `DD-MM-YYYY HH:mm` for consultation timestamps. Times are wall-clock local time
//! with no zone attached.

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use thiserror::Error;

/// Date-only layout.
pub const DATE_FORMAT: &str = "%d-%m-%Y";
/// Date with hour and minute.
pub const DATE_TIME_FORMAT: &str = "%d-%m-%Y %H:%M";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DateError {
    #[error("Invalid date '{0}': expected DD-MM-YYYY or DD-MM-YYYY HH:mm")]
    Invalid(String),
}

/// Format as `DD-MM-YYYY HH:mm`, or `DD-MM-YYYY` when `include_time` is false.
pub fn format_date_time(value: &NaiveDateTime, include_time: bool) -> String {
    if include_time {
        value.format(DATE_TIME_FORMAT).to_string()
    } else {
        value.format(DATE_FORMAT).to_string()
    }
}

/// Parse `DD-MM-YYYY HH:mm` or `DD-MM-YYYY` (midnight).
pub fn parse_date_time(input: &str) -> Result<NaiveDateTime, DateError> {
    let trimmed = input.trim();
    if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, DATE_TIME_FORMAT) {
        return Ok(value);
    }

    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| DateError::Invalid(input.to_string()))
}

/// Current local wall-clock time, truncated to the minute like the stored strings.
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    let formatted = format_date_time(&now, true);
    parse_date_time(&formatted).unwrap_or(now)
}

/// Earliest instant reported when no consultation exists: the Unix epoch, as local
/// wall-clock time.
pub fn epoch() -> NaiveDateTime {
    Local.from_utc_datetime(&NaiveDateTime::default()).naive_local()
}

/// Local wall-clock time converted to UTC, as ISO-8601 with millisecond precision.
///
/// Times skipped by a daylight-saving jump have no local instant and are taken as UTC.
pub fn to_iso_string(value: &NaiveDateTime) -> String {
    let utc = Local
        .from_local_datetime(value)
        .earliest()
        .map(|local| local.naive_utc())
        .unwrap_or(*value);
    utc.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Chart axis label (`YYYY-MM-DD`) for a stored date string; the time part is ignored.
pub fn chart_label(input: &str) -> Option<String> {
    let date_part = input.split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}
