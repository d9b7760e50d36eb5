//! # HTTP Utilities
//!
//! This module provides helpers for turning HTTP responses into typed values
//! and user-facing errors: status hints, strict JSON decoding with a body
//! preview, and the error types shared by the request helpers.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::text_processing::redact_sensitive;

const BODY_PREVIEW_LIMIT: usize = 200;

/// Return a user-friendly error message for common HTTP status codes.
///
/// # Example
/// ```rust
/// use panzer_util::http::status_error_message;
///
/// let error_401 = status_error_message(401).unwrap();
/// assert!(error_401.contains("cf login"));
///
/// let error_403 = status_error_message(403).unwrap();
/// assert!(error_403.contains("Forbidden"));
///
/// assert!(status_error_message(500).is_none());
/// ```
pub fn status_error_message(status_code: u16) -> Option<String> {
    match status_code {
        401 => Some(
            "Unauthorized (401). Hint: the access token may have expired, run 'cf login' or 'cf oauth-token'".into(),
        ),
        403 => Some("Forbidden (403). Hint: check your org/space roles".into()),
        404 => Some("Not Found (404). Hint: the resource may have been deleted or you lack access to it".into()),
        _ => None,
    }
}

/// Parse HTTP response text into `T`, providing detailed errors on failure.
///
/// Any decoding error is decorated with the originating HTTP status code and
/// a truncated, redacted preview of the response body.
pub fn parse_response_strict<T: DeserializeOwned>(text: &str, status: Option<StatusCode>) -> Result<T, JsonParseError> {
    serde_json::from_str::<T>(text).map_err(|error| {
        let status_note = status
            .map(|code| format!("status {code}"))
            .unwrap_or_else(|| "unknown status".to_string());
        JsonParseError::new(status_note, error, truncate_response_preview(text, BODY_PREVIEW_LIMIT))
    })
}

/// Collapse whitespace, redact credentials and cut a response body down to
/// `limit` characters for error messages.
pub fn truncate_response_preview(text: &str, limit: usize) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }

    let mut preview = String::new();
    for ch in text.chars() {
        if preview.chars().count() >= limit {
            preview.push_str("...");
            break;
        }
        match ch {
            '\n' | '\r' | '\t' => {
                if !preview.ends_with(' ') {
                    preview.push(' ');
                }
            }
            _ => preview.push(ch),
        }
    }

    redact_sensitive(preview.trim())
}

/// Error returned when strict JSON parsing of an HTTP response fails.
#[derive(Debug, Error)]
#[error("failed to parse JSON response ({status_note}): {source}. body preview: {body_preview}")]
pub struct JsonParseError {
    status_note: String,
    #[source]
    source: serde_json::Error,
    body_preview: String,
}

impl JsonParseError {
    pub fn new(status_note: String, source: serde_json::Error, body_preview: String) -> Self {
        Self {
            status_note,
            source,
            body_preview,
        }
    }

    /// Access the truncated response preview captured during parsing.
    pub fn body_preview(&self) -> &str {
        &self.body_preview
    }
}

/// Failures of a single API request.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(
        "GET {url} returned {status}{}: {body_preview}",
        hint.as_deref().map(|h| format!(" ({h})")).unwrap_or_default()
    )]
    Status {
        url: String,
        status: u16,
        hint: Option<String>,
        body_preview: String,
    },

    #[error("GET {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: JsonParseError,
    },
}

impl HttpError {
    /// HTTP status code when the server answered with a failure status.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
