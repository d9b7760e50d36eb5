//! # Panzer Engine
//!
//! The report pipelines behind the `panzer` commands. Each report fetches
//! resources from the v3 API, correlates them by GUID, formats the values and
//! writes a text table to the output of a [`ReportContext`].
//!
//! ## Reports
//!
//! - **`apps`**: apps and processes of the targeted space, optionally with
//!   per-instance statistics ([`stats`]) and the space quota usage ([`quota`])
//! - **`routes`**: routes of a hostname with their domain, org, space and apps
//! - **`events`**: recent audit events with server and client side filters
//!
//! Column selection lives in [`columns`], environment settings in
//! [`settings`].

pub mod apps;
pub mod columns;
pub mod context;
pub mod events;
pub mod filters;
pub mod quota;
pub mod routes;
pub mod settings;
pub mod stats;

pub use apps::{AppsOptions, run_apps_report};
pub use columns::{Column, ColumnError, resolve_columns, stats_required};
pub use context::ReportContext;
pub use events::{EventsOptions, run_events_report};
pub use filters::FilterError;
pub use routes::{RoutesOptions, run_routes_report};
pub use settings::{ReportSettings, SettingsError};
pub use stats::{FanOutLimits, StatsSource, fetch_process_stats};
