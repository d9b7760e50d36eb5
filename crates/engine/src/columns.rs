//! Column selection for the apps report.
//!
//! The set of printed columns comes from the `CF_COLS` environment variable.
//! Columns are either app-level (one value per process row) or
//! instance-level (one line per running instance, which requires fetching
//! process statistics).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Environment variable holding a comma separated column list, or `ALL`.
pub const COLUMNS_ENV: &str = "CF_COLS";

const ALL_COLUMNS_KEYWORD: &str = "ALL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    State,
    Memory,
    LogRate,
    Disk,
    Type,
    Instances,
    Index,
    Host,
    Cpu,
    MemUsed,
    DiskUsed,
    LogRateUsed,
    Created,
    Updated,
    Buildpacks,
    Stack,
    HealthCheck,
    InvocationTimeout,
    Timeout,
    Guid,
    ProcState,
    ProcType,
    Uptime,
    InstancePorts,
}

/// Every selectable column in display order. `Ix` is absent: it is only ever
/// added implicitly in front of instance-level columns.
pub const VALID_COLUMNS: &[Column] = &[
    Column::Name,
    Column::State,
    Column::Memory,
    Column::LogRate,
    Column::Disk,
    Column::Type,
    Column::Instances,
    Column::Host,
    Column::Cpu,
    Column::MemUsed,
    Column::DiskUsed,
    Column::LogRateUsed,
    Column::Created,
    Column::Updated,
    Column::Buildpacks,
    Column::Stack,
    Column::HealthCheck,
    Column::InvocationTimeout,
    Column::Timeout,
    Column::Guid,
    Column::ProcState,
    Column::ProcType,
    Column::Uptime,
    Column::InstancePorts,
];

pub const DEFAULT_COLUMNS: &[Column] = &[
    Column::Name,
    Column::State,
    Column::Memory,
    Column::Disk,
    Column::Updated,
    Column::HealthCheck,
    Column::Instances,
    Column::Host,
    Column::ProcState,
    Column::Uptime,
    Column::Cpu,
    Column::MemUsed,
];

impl Column {
    /// Header text, which is also the name accepted in `CF_COLS`.
    pub fn header(self) -> &'static str {
        match self {
            Column::Name => "Name",
            Column::State => "State",
            Column::Memory => "Memory",
            Column::LogRate => "LogRate",
            Column::Disk => "Disk",
            Column::Type => "Type",
            Column::Instances => "#Inst",
            Column::Index => "Ix",
            Column::Host => "Host",
            Column::Cpu => "Cpu%",
            Column::MemUsed => "MemUsed",
            Column::DiskUsed => "DiskUsed",
            Column::LogRateUsed => "LogRateUsed",
            Column::Created => "Created",
            Column::Updated => "Updated",
            Column::Buildpacks => "Buildpacks",
            Column::Stack => "Stack",
            Column::HealthCheck => "HealthCheck",
            Column::InvocationTimeout => "InvocTmout",
            Column::Timeout => "Tmout",
            Column::Guid => "Guid",
            Column::ProcState => "ProcState",
            Column::ProcType => "ProcType",
            Column::Uptime => "Uptime",
            Column::InstancePorts => "InstancePorts",
        }
    }

    /// Whether the column shows one line per running instance.
    pub fn is_instance_level(self) -> bool {
        matches!(
            self,
            Column::Index
                | Column::Host
                | Column::Cpu
                | Column::MemUsed
                | Column::DiskUsed
                | Column::LogRateUsed
                | Column::ProcState
                | Column::ProcType
                | Column::Uptime
                | Column::InstancePorts
        )
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for Column {
    type Err = ColumnError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        VALID_COLUMNS
            .iter()
            .copied()
            .find(|column| column.header() == name)
            .ok_or_else(|| ColumnError::Invalid {
                name: name.to_string(),
                valid: valid_column_names(),
            })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColumnError {
    #[error("Invalid column in CF_COLS envvar : {name}.\nValid column names are: {valid}")]
    Invalid { name: String, valid: String },
}

/// Comma separated list of the names accepted in `CF_COLS`.
pub fn valid_column_names() -> String {
    VALID_COLUMNS.iter().map(|column| column.header()).collect::<Vec<_>>().join(",")
}

/// Resolve the requested column list.
///
/// - `None` or blank: [`DEFAULT_COLUMNS`]
/// - `ALL`: [`VALID_COLUMNS`]
/// - otherwise a comma separated list naming at least one column; `Ix` is
///   prepended when the list holds an instance-level column
pub fn resolve_columns(requested: Option<&str>) -> Result<Vec<Column>, ColumnError> {
    let requested = requested.map(str::trim).unwrap_or_default();
    if requested.is_empty() {
        return Ok(DEFAULT_COLUMNS.to_vec());
    }
    if requested == ALL_COLUMNS_KEYWORD {
        return Ok(VALID_COLUMNS.to_vec());
    }

    let mut columns = requested
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(Column::from_str)
        .collect::<Result<Vec<_>, _>>()?;
    if columns.is_empty() {
        return Err(ColumnError::Invalid {
            name: String::new(),
            valid: valid_column_names(),
        });
    }

    if stats_required(&columns) {
        columns.insert(0, Column::Index);
    }
    Ok(columns)
}

/// True when any column needs per-instance statistics.
pub fn stats_required(columns: &[Column]) -> bool {
    columns.iter().any(|column| column.is_instance_level())
}
