//! Environment-driven report settings.

use std::env;
use std::time::Duration;

use panzer_api::{ClientSettings, DEFAULT_HTTP_TIMEOUT_SECS};
use thiserror::Error;

use crate::columns::{COLUMNS_ENV, Column, ColumnError, resolve_columns};
use crate::stats::{DEFAULT_LAUNCH_INTERVAL, DEFAULT_MAX_IN_FLIGHT, FanOutLimits};

pub const HTTP_TIMEOUT_ENV: &str = "PANZER_HTTP_TIMEOUT";
pub const STATS_CONCURRENCY_ENV: &str = "PANZER_STATS_CONCURRENCY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// Settings shared by every report of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    /// Raw `CF_COLS` value; resolved lazily by the apps report.
    pub requested_columns: Option<String>,
    pub http_timeout: Duration,
    pub stats_limits: FanOutLimits,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            requested_columns: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            stats_limits: FanOutLimits::default(),
        }
    }
}

impl ReportSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs =
            parse_positive(HTTP_TIMEOUT_ENV, lookup(HTTP_TIMEOUT_ENV))?.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        let max_in_flight = parse_positive(STATS_CONCURRENCY_ENV, lookup(STATS_CONCURRENCY_ENV))?
            .map(|value| value as usize)
            .unwrap_or(DEFAULT_MAX_IN_FLIGHT);

        Ok(Self {
            requested_columns: lookup(COLUMNS_ENV),
            http_timeout: Duration::from_secs(timeout_secs),
            stats_limits: FanOutLimits {
                max_in_flight,
                launch_interval: DEFAULT_LAUNCH_INTERVAL,
            },
        })
    }

    pub fn columns(&self) -> Result<Vec<Column>, ColumnError> {
        resolve_columns(self.requested_columns.as_deref())
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            timeout: self.http_timeout,
        }
    }
}

fn parse_positive(name: &'static str, raw: Option<String>) -> Result<Option<u64>, SettingsError> {
    let Some(raw) = raw else { return Ok(None) };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<u64>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(SettingsError::InvalidNumber { name, value: raw }),
    }
}
