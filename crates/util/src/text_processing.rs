//! # Text Processing Utilities
//!
//! This module provides utilities for text processing: redaction of
//! credentials before they reach logs or error messages, and measuring the
//! visible width of strings that may carry ANSI color escapes.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_width::UnicodeWidthStr;

/// Matches ANSI SGR/CSI escape sequences such as `\x1b[1;32m`.
static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").unwrap());

/// Redacts values that look like secrets in a string.
///
/// This function scans input text for patterns that commonly indicate
/// sensitive information: authorization headers, bearer tokens, JWTs and
/// token/secret assignments. When found, these values are replaced with
/// `[REDACTED]` while preserving the key names for debugging purposes.
///
/// # Example
/// ```rust
/// use panzer_util::text_processing::redact_sensitive;
///
/// let redacted = redact_sensitive("REFRESH_TOKEN=xyz789");
/// assert_eq!(redacted, "REFRESH_TOKEN=[REDACTED]");
///
/// let redacted = redact_sensitive("Authorization: bearer secret123");
/// assert_eq!(redacted, "Authorization: [REDACTED]");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    redact_sensitive_with(input, "[REDACTED]")
}

/// Redacts sensitive-looking values, using a custom replacement token.
pub fn redact_sensitive_with(input: &str, replacement: &str) -> String {
    let mut redacted = input.to_string();

    for pattern in get_redact_patterns().iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                if captures.get(2).is_some() {
                    format!("{}{}", prefix, replacement)
                } else {
                    replacement.to_string()
                }
            })
            .to_string();
    }

    redacted
}

/// Returns compiled regex patterns for detecting sensitive information.
///
/// Patterns with two capture groups keep group 1 (the key) and replace
/// group 2 (the value); single-group patterns replace the whole match.
pub fn get_redact_patterns() -> &'static Vec<Regex> {
    static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(build_redact_patterns);

    &REDACT_PATTERNS
}

fn build_redact_patterns() -> Vec<Regex> {
    vec![
        Regex::new(r"(?i)(authorization:\s+)([^\s]+(?:\s+[^\s,;]+)?)").unwrap(),
        Regex::new(r"(?i)((?:^|\b)bearer\s+)([A-Za-z0-9\-._~+/]+=*)").unwrap(),
        Regex::new(r#"(?i)((?:access|refresh)[_-]?token"?\s*[:=]\s*"?)([^\s",}]+)"#).unwrap(),
        Regex::new(r"(?i)([A-Z0-9_]*?(?:TOKEN|SECRET|PASSWORD|API_KEY)\s*=\s*)([^\s]+)").unwrap(),
        Regex::new(r"(eyJ[A-Za-z0-9\-_]+\.[A-Za-z0-9\-_]+\.[A-Za-z0-9\-_]*)").unwrap(),
    ]
}

/// Removes ANSI escape sequences from a string.
///
/// # Example
/// ```rust
/// use panzer_util::text_processing::strip_ansi;
///
/// assert_eq!(strip_ansi("\u{1b}[32mstarted\u{1b}[0m"), "started");
/// ```
pub fn strip_ansi(input: &str) -> String {
    ANSI_ESCAPE.replace_all(input, "").into_owned()
}

/// Number of terminal columns a string occupies once escapes are removed.
pub fn visible_width(input: &str) -> usize {
    if input.contains('\x1b') {
        strip_ansi(input).width()
    } else {
        input.width()
    }
}
