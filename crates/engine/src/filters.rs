//! User-supplied filters shared by the reports.

use chrono::{DateTime, Utc};
use panzer_util::{TimeParseError, format_rfc3339};
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid app name filter '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    InvalidTime(#[from] TimeParseError),

    #[error("--since {since} is later than --until {until}")]
    ReversedTimeRange { since: String, until: String },

    #[error("--space given without --org and no org is targeted")]
    SpaceWithoutOrg,
}

/// Compile the `--appname` filter; no filter matches every app.
pub fn compile_name_filter(pattern: Option<&str>) -> Result<Regex, FilterError> {
    let pattern = pattern.unwrap_or_default();
    Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Reject ranges whose lower bound lies after the upper bound.
pub fn check_time_range(since: Option<&DateTime<Utc>>, until: Option<&DateTime<Utc>>) -> Result<(), FilterError> {
    match (since, until) {
        (Some(since), Some(until)) if since > until => Err(FilterError::ReversedTimeRange {
            since: format_rfc3339(Some(since)),
            until: format_rfc3339(Some(until)),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn missing_name_filter_matches_everything() {
        let filter = compile_name_filter(None).unwrap();
        assert!(filter.is_match("anything"));
        assert!(filter.is_match(""));
    }

    #[test]
    fn name_filter_is_an_unanchored_regex() {
        let filter = compile_name_filter(Some("^api-")).unwrap();
        assert!(filter.is_match("api-gateway"));
        assert!(!filter.is_match("my-api-gateway"));

        let filter = compile_name_filter(Some("gate")).unwrap();
        assert!(filter.is_match("my-api-gateway"));
    }

    #[test]
    fn broken_name_filter_is_reported() {
        let error = compile_name_filter(Some("api-(")).unwrap_err();
        assert!(error.to_string().contains("api-("));
    }

    #[test]
    fn reversed_time_range_is_rejected() {
        let early = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();

        assert!(check_time_range(Some(&early), Some(&late)).is_ok());
        assert!(check_time_range(Some(&late), None).is_ok());
        let error = check_time_range(Some(&late), Some(&early)).unwrap_err();
        assert_eq!(
            error.to_string(),
            "--since 2024-03-02T00:00:00Z is later than --until 2024-03-01T00:00:00Z"
        );
    }
}
