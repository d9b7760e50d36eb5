//! # Date Handling Utilities
//!
//! Formatting of API timestamps for table output and parsing of the
//! user-supplied bounds of an event time range.

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use thiserror::Error;

/// Layout of event timestamps in the events table.
pub const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Error returned when a time bound cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid time '{input}': expected RFC 3339, YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD")]
pub struct TimeParseError {
    input: String,
}

/// Formats a timestamp as RFC 3339 in UTC with whole seconds, or `-`.
///
/// # Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use panzer_util::date_handling::format_rfc3339;
///
/// let created = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
/// assert_eq!(format_rfc3339(Some(&created)), "2024-03-01T10:00:00Z");
/// assert_eq!(format_rfc3339(None), "-");
/// ```
pub fn format_rfc3339(timestamp: Option<&DateTime<Utc>>) -> String {
    timestamp
        .map(|value| value.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "-".to_string())
}

/// Formats a timestamp in the local time zone using [`LOCAL_TIMESTAMP_FORMAT`].
pub fn format_local_timestamp(timestamp: Option<&DateTime<Utc>>) -> String {
    timestamp
        .map(|value| value.with_timezone(&Local).format(LOCAL_TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Parses a time bound given on the command line.
///
/// Accepted forms, tried in order:
/// - RFC 3339 (`2024-03-01T10:00:00Z`, `2024-03-01T10:00:00+01:00`)
/// - local date and time (`2024-03-01T10:00:00`)
/// - local date, meaning midnight (`2024-03-01`)
pub fn parse_time_bound(input: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let trimmed = input.trim();
    let error = || TimeParseError {
        input: input.to_string(),
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(trimmed, LOCAL_TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(error)?;

    match Local.from_local_datetime(&naive) {
        LocalResult::Single(local) => Ok(local.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(error()),
    }
}
