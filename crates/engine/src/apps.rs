//! The apps report (`aa`): one row per app process of the targeted space.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use panzer_types::{App, Process, ProcessStats};
use panzer_util::http::list_all;
use panzer_util::{
    BYTES_PER_MB, TextTable, format_elapsed_time, format_megabytes, format_rfc3339, format_unit, percent_of, terminal,
};
use regex::Regex;
use tracing::debug;

use crate::columns::{Column, stats_required};
use crate::context::ReportContext;
use crate::filters::compile_name_filter;
use crate::quota::{SpaceUsage, write_space_quota_usage};
use crate::stats::{StatsByProcess, fetch_process_stats};

const APPS_PAGE_SIZE: &str = "1000";

#[derive(Debug, Clone, Default)]
pub struct AppsOptions {
    /// Regular expression apps must match to be reported.
    pub name_filter: Option<String>,
    /// Omit the banner, table headers and totals.
    pub hide_headers: bool,
    pub show_quota_usage: bool,
}

pub async fn run_apps_report<W: Write>(ctx: &mut ReportContext<W>, options: &AppsOptions) -> Result<()> {
    let columns = ctx.settings.columns()?;
    let name_filter = compile_name_filter(options.name_filter.as_deref())?;
    let (organization, space) = {
        let target = ctx.session.require_target()?;
        (target.organization.clone(), target.space.clone())
    };

    if !options.hide_headers {
        let user = ctx.username();
        writeln!(
            ctx.out(),
            "Getting apps for org {} / space {} as {}...\n",
            terminal::entity_name(&organization.name),
            terminal::entity_name(&space.name),
            terminal::entity_name(&user)
        )?;
    }

    let space_query = [("space_guids", space.guid.clone()), ("per_page", APPS_PAGE_SIZE.to_string())];
    let apps: Vec<App> = list_all(&ctx.client, "/v3/apps", &space_query)
        .await
        .context("failed to list apps")?;
    if apps.is_empty() {
        writeln!(ctx.out(), "No apps found")?;
        return Ok(());
    }

    let processes: Vec<Process> = list_all(&ctx.client, "/v3/processes", &space_query)
        .await
        .context("failed to list processes")?;
    let listing = AppListing::new(apps, processes, &name_filter);
    debug!(apps = listing.apps.len(), processes = listing.processes.len(), "apps listing built");

    let stats = if stats_required(&columns) && !listing.processes.is_empty() {
        let source = Arc::new(ctx.client.clone());
        Some(fetch_process_stats(source, &listing.processes, &ctx.settings.stats_limits).await?)
    } else {
        None
    };

    let table = listing.table(&columns, stats.as_ref(), options.hide_headers);
    table.write_to(ctx.out())?;

    let totals = listing.totals(stats.as_ref());
    if !options.hide_headers && totals.processes > 0 {
        writeln!(ctx.out(), "\n  {}", terminal::stopped(&totals.summary_line()))?;
    }

    if options.show_quota_usage {
        write_space_quota_usage(ctx, &space, &SpaceUsage::from(&totals)).await?;
    }
    Ok(())
}

/// Apps matching the name filter and their reportable processes, sorted by
/// app name.
#[derive(Debug, Clone, Default)]
pub struct AppListing {
    apps: HashMap<String, App>,
    processes: Vec<Process>,
}

impl AppListing {
    /// Keep the apps matching `name_filter` and the processes belonging to
    /// them, dropping tasks scaled to zero.
    pub fn new(apps: Vec<App>, processes: Vec<Process>, name_filter: &Regex) -> Self {
        let apps: HashMap<String, App> = apps
            .into_iter()
            .filter(|app| name_filter.is_match(&app.name))
            .map(|app| (app.guid.clone(), app))
            .collect();

        let mut processes: Vec<Process> = processes
            .into_iter()
            .filter(|process| !process.is_idle_task())
            .filter(|process| process.app_guid().is_some_and(|guid| apps.contains_key(guid)))
            .collect();
        processes.sort_by_cached_key(|process| {
            process
                .app_guid()
                .and_then(|guid| apps.get(guid))
                .map(|app| app.name.to_lowercase())
                .unwrap_or_default()
        });

        Self { apps, processes }
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    fn app_of(&self, process: &Process) -> Option<&App> {
        process.app_guid().and_then(|guid| self.apps.get(guid))
    }

    pub fn table(&self, columns: &[Column], stats: Option<&StatsByProcess>, hide_headers: bool) -> TextTable {
        let mut table = TextTable::new(columns.iter().map(|column| column.header()));
        if hide_headers {
            table.hide_headers();
        }
        for process in &self.processes {
            let Some(app) = self.app_of(process) else { continue };
            let instances = stats.and_then(|stats| stats.get(&process.guid)).map(Vec::as_slice).unwrap_or_default();
            table.add_row(columns.iter().map(|column| cell_value(*column, app, process, instances)));
        }
        table
    }

    /// Sum the reported processes. Requested figures count STARTED apps only;
    /// used figures are present when stats were fetched.
    pub fn totals(&self, stats: Option<&StatsByProcess>) -> Totals {
        let mut totals = Totals {
            used: stats.map(|_| UsedTotals::default()),
            ..Totals::default()
        };

        for process in &self.processes {
            let Some(app) = self.app_of(process) else { continue };
            totals.processes += 1;
            if !app.is_started() {
                continue;
            }
            totals.started += 1;
            totals.instances += process.instances;
            totals.memory_mb += process.memory_in_mb * process.instances;
            totals.disk_mb += process.disk_in_mb * process.instances;
            totals.log_rate += process.log_rate_limit().max(0) * process.instances;

            if let (Some(used), Some(stats)) = (totals.used.as_mut(), stats) {
                for instance in stats.get(&process.guid).map(Vec::as_slice).unwrap_or_default() {
                    used.memory_mb += instance.usage.mem / BYTES_PER_MB;
                    used.disk_mb += instance.usage.disk / BYTES_PER_MB;
                    used.log_rate += instance.usage.log_rate;
                    used.cpu_percent += instance.usage.cpu * 100.0;
                }
            }
        }
        totals
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    /// Reported processes.
    pub processes: usize,
    /// Reported processes of STARTED apps.
    pub started: usize,
    pub instances: i64,
    pub memory_mb: i64,
    pub disk_mb: i64,
    /// Bytes per second; unlimited processes count as zero.
    pub log_rate: i64,
    pub used: Option<UsedTotals>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsedTotals {
    pub memory_mb: i64,
    pub disk_mb: i64,
    pub log_rate: i64,
    pub cpu_percent: f64,
}

impl Totals {
    pub fn summary_line(&self) -> String {
        let head = format!(
            "{} apps ({} started), {} running instances",
            self.processes, self.started, self.instances
        );
        match &self.used {
            Some(used) => format!(
                "{head}, Memory(MB): requested:{}, used:{} ({:2}%), Cpu {:4.0}%, \
                 Disk(MB): requested:{}, used:{} ({:2}%), \
                 LogRate(BPS): requested:{}, used:{} ({:2}%)",
                format_megabytes(self.memory_mb),
                format_megabytes(used.memory_mb),
                percent_of(used.memory_mb, self.memory_mb),
                used.cpu_percent,
                format_megabytes(self.disk_mb),
                format_megabytes(used.disk_mb),
                percent_of(used.disk_mb, self.disk_mb),
                format_unit(self.log_rate),
                format_unit(used.log_rate),
                percent_of(used.log_rate, self.log_rate).max(0),
            ),
            None => format!(
                "{head}, Memory(MB): requested:{}, Disk(MB): requested:{}, LogRate(BPS): requested:{}",
                format_megabytes(self.memory_mb),
                format_megabytes(self.disk_mb),
                format_unit(self.log_rate),
            ),
        }
    }
}

/// Render one cell. Instance-level cells hold one line per instance and stay
/// empty for stopped apps.
pub fn cell_value(column: Column, app: &App, process: &Process, instances: &[ProcessStats]) -> String {
    if column.is_instance_level() {
        if app.is_stopped() {
            return String::new();
        }
        return instances
            .iter()
            .enumerate()
            .map(|(position, stats)| instance_cell(column, app, process, position, stats))
            .collect::<Vec<_>>()
            .join("\n");
    }

    match column {
        Column::Name => app.name.clone(),
        Column::Guid => app.guid.clone(),
        Column::State => {
            let state = app.state.to_lowercase();
            if app.is_stopped() {
                terminal::stopped(&state)
            } else {
                terminal::success(&state)
            }
        }
        Column::Memory => format!("{:>6}", format_megabytes(process.memory_in_mb)),
        Column::LogRate => format!("{:>6}", format_unit(process.log_rate_limit())),
        Column::Disk => format!("{:>6}", format_megabytes(process.disk_in_mb)),
        Column::Type => format!("{:>4}", process.process_type),
        Column::Instances => format!("{:>5}", process.instances),
        Column::Created => format_rfc3339(app.created_at.as_ref()),
        Column::Updated => format_rfc3339(app.updated_at.as_ref()),
        Column::Buildpacks => app.lifecycle.data.buildpacks.join(","),
        Column::Stack => app.lifecycle.data.stack.clone(),
        Column::HealthCheck => format!("{:>11}", process.health_check.check_type),
        Column::InvocationTimeout => optional_seconds(process.health_check.data.invocation_timeout),
        Column::Timeout => optional_seconds(process.health_check.data.timeout),
        Column::Index
        | Column::Host
        | Column::Cpu
        | Column::MemUsed
        | Column::DiskUsed
        | Column::LogRateUsed
        | Column::ProcState
        | Column::ProcType
        | Column::Uptime
        | Column::InstancePorts => String::new(),
    }
}

fn instance_cell(column: Column, app: &App, process: &Process, position: usize, stats: &ProcessStats) -> String {
    match column {
        Column::Index => position.to_string(),
        Column::Host => stats.host.clone(),
        Column::Cpu => format!("{:5.1}", stats.usage.cpu * 100.0),
        Column::MemUsed => usage_with_percent(stats.usage.mem / BYTES_PER_MB, process.memory_in_mb),
        Column::DiskUsed => usage_with_percent(stats.usage.disk / BYTES_PER_MB, process.disk_in_mb),
        Column::LogRateUsed => {
            let used = stats.usage.log_rate;
            if process.has_log_rate_limit() {
                let percent = percent_of(used, process.log_rate_limit());
                let padded = format!("{percent:>2}");
                let colored = if percent > 80 {
                    terminal::failure(&padded)
                } else {
                    terminal::success(&padded)
                };
                format!("{:>4} ({colored}%)", format_unit(used))
            } else {
                format!("{:>6}", format_unit(used))
            }
        }
        Column::ProcState => {
            let state = stats.state.to_lowercase();
            let crashed_or_down = stats.state == "CRASHED" || stats.state == "DOWN";
            if app.is_started() && crashed_or_down {
                terminal::failure(&state)
            } else if (app.is_stopped() && stats.state == "DOWN") || (app.is_started() && stats.state == "STARTING") {
                terminal::entity_name(&state)
            } else {
                terminal::success(&state)
            }
        }
        Column::ProcType => format!("{:>8}", process.process_type),
        Column::Uptime => format!("{:>12}", format_elapsed_time(stats.uptime)),
        Column::InstancePorts => stats
            .instance_ports
            .iter()
            .map(|port| port.internal.to_string())
            .collect::<Vec<_>>()
            .join(","),
        Column::Name
        | Column::State
        | Column::Memory
        | Column::LogRate
        | Column::Disk
        | Column::Type
        | Column::Instances
        | Column::Created
        | Column::Updated
        | Column::Buildpacks
        | Column::Stack
        | Column::HealthCheck
        | Column::InvocationTimeout
        | Column::Timeout
        | Column::Guid => String::new(),
    }
}

/// `used (pct%)`: below 25% is advisory, above 90% a failure.
fn usage_with_percent(used_mb: i64, limit_mb: i64) -> String {
    let percent = percent_of(used_mb, limit_mb);
    let padded = format!("{percent:>2}");
    let colored = if percent > 90 {
        terminal::failure(&padded)
    } else if percent < 25 {
        terminal::advisory(&padded)
    } else {
        terminal::success(&padded)
    };
    format!("{:>4} ({colored}%)", format_megabytes(used_mb))
}

fn optional_seconds(value: Option<f64>) -> String {
    value.map(|seconds| seconds.to_string()).unwrap_or_else(|| "-".to_string())
}
