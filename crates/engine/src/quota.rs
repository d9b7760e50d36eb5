//! Space quota usage table, printed below the apps report with `-u`.

use std::io::Write;

use anyhow::{Context, Result};
use panzer_api::TargetRef;
use panzer_types::{Route, ServiceInstance, Space, SpaceQuota};
use panzer_util::http::{count_resources, get_resource};
use panzer_util::{TextTable, format_megabytes, format_unit, percent_of, terminal};

use crate::apps::Totals;
use crate::context::ReportContext;

const QUOTA_ALERT_PERCENT: i64 = 80;
const UNLIMITED: &str = "unlimited";

/// What the space currently consumes, compared against its quota.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpaceUsage {
    pub instances: i64,
    pub memory_requested_mb: i64,
    pub memory_used_mb: i64,
    pub log_rate_requested: i64,
    pub log_rate_used: i64,
    pub service_instances: u64,
    pub routes: u64,
}

impl From<&Totals> for SpaceUsage {
    fn from(totals: &Totals) -> Self {
        let used = totals.used.clone().unwrap_or_default();
        Self {
            instances: totals.instances,
            memory_requested_mb: totals.memory_mb,
            memory_used_mb: used.memory_mb,
            log_rate_requested: totals.log_rate,
            log_rate_used: used.log_rate,
            service_instances: 0,
            routes: 0,
        }
    }
}

/// Look up the quota of `space` and print its usage table.
///
/// A space without a quota only gets a notice; any failed request is an error.
pub async fn write_space_quota_usage<W: Write>(
    ctx: &mut ReportContext<W>,
    space: &TargetRef,
    usage: &SpaceUsage,
) -> Result<()> {
    let details: Space = get_resource(&ctx.client, "spaces", &space.guid)
        .await
        .context("failed to get space")?;
    let Some(quota_guid) = details.quota_guid() else {
        writeln!(ctx.out(), "No space quota found for space {}", terminal::entity_name(&space.name))?;
        return Ok(());
    };

    let quota: SpaceQuota = get_resource(&ctx.client, "space_quotas", quota_guid)
        .await
        .context("failed to get space_quota")?;

    let space_query = [("space_guids", space.guid.clone())];
    let usage = SpaceUsage {
        service_instances: count_resources::<ServiceInstance>(&ctx.client, "/v3/service_instances", &space_query)
            .await
            .context("failed to get service instances")?,
        routes: count_resources::<Route>(&ctx.client, "/v3/routes", &space_query)
            .await
            .context("failed to get routes")?,
        ..usage.clone()
    };

    writeln!(ctx.out())?;
    quota_usage_table(&quota, &usage).write_to(ctx.out())?;
    Ok(())
}

pub fn quota_usage_table(quota: &SpaceQuota, usage: &SpaceUsage) -> TextTable {
    let mut table = TextTable::new(["Quota", "Usage", "Allocation", "Quota", "Quota %"]);
    let no_allocation = format!("{:>9}", "-");

    let instances_limit = limit(quota.apps.total_instances);
    table.add_row([
        "app instances".to_string(),
        format!("{:5}", usage.instances),
        no_allocation.clone(),
        limit_text(instances_limit, |value| value.to_string()),
        percent_cell(usage.instances, instances_limit),
    ]);

    let services_limit = limit(quota.services.total_service_instances);
    let services = usage.service_instances as i64;
    table.add_row([
        "service instances".to_string(),
        format!("{services:5}"),
        no_allocation.clone(),
        limit_text(services_limit, |value| format!("{value:5}")),
        percent_cell(services, services_limit),
    ]);

    let routes_limit = limit(quota.routes.total_routes);
    let routes = usage.routes as i64;
    table.add_row([
        "routes".to_string(),
        format!("{routes:5}"),
        no_allocation,
        limit_text(routes_limit, |value| format!("{value:5}")),
        percent_cell(routes, routes_limit),
    ]);

    let memory_limit = limit(quota.apps.total_memory_in_mb);
    table.add_row([
        "memory".to_string(),
        format!("{:>5}", format_megabytes(usage.memory_used_mb)),
        format!("{:>10}", format_megabytes(usage.memory_requested_mb)),
        limit_text(memory_limit, |value| format!("{:>5}", format_megabytes(value))),
        percent_cell(usage.memory_requested_mb, memory_limit),
    ]);

    let log_rate_limit = limit(quota.apps.log_rate_limit_in_bytes_per_second);
    table.add_row([
        "log_rate".to_string(),
        format!("{:>5}", format_unit(usage.log_rate_used)),
        format!("{:>10}", format_unit(usage.log_rate_requested)),
        limit_text(log_rate_limit, |value| format!("{:>5}", format_unit(value))),
        percent_cell(usage.log_rate_requested, log_rate_limit),
    ]);

    table
}

/// Negative limits (`-1`) mean unlimited, like a null one.
fn limit(value: Option<i64>) -> Option<i64> {
    value.filter(|value| *value >= 0)
}

fn limit_text(limit: Option<i64>, render: impl Fn(i64) -> String) -> String {
    limit.map(render).unwrap_or_else(|| UNLIMITED.to_string())
}

fn percent_cell(used: i64, limit: Option<i64>) -> String {
    let Some(limit) = limit else {
        return format!("{:>7}", "-");
    };
    // A zero limit is exhausted by any usage.
    let percent = if limit == 0 && used > 0 { 100 } else { percent_of(used, limit) };
    let padded = format!("{percent:>7}");
    if percent > QUOTA_ALERT_PERCENT {
        terminal::failure(&padded)
    } else {
        terminal::success(&padded)
    }
}
