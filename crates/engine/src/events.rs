//! The events report (`ev`): recent audit events, oldest first.
//!
//! Org and space names and the time range are applied by the API; action,
//! target, type and actor are substring filters applied locally.

use std::io::Write;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use panzer_api::{CfClient, Session};
use panzer_types::{AuditEvent, ListResponse, Organization, Space};
use panzer_util::http::get_json;
use panzer_util::{TextTable, format_local_timestamp, parse_time_bound, terminal};
use tracing::debug;

use crate::context::ReportContext;
use crate::filters::{FilterError, check_time_range};

pub const DEFAULT_EVENT_LIMIT: u32 = 500;
pub const MAX_EVENT_LIMIT: u32 = 5000;

const EVENT_COLUMNS: [&str; 5] = ["timestamp", "action", "target", "type", "actor"];
const MISSING_TARGET: &str = "<N/A>";

#[derive(Debug, Clone, Default)]
pub struct EventsOptions {
    pub limit: Option<u32>,
    pub action: Option<String>,
    pub target: Option<String>,
    pub target_type: Option<String>,
    pub actor: Option<String>,
    pub org: Option<String>,
    pub space: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
}

/// Client side filters; an unset filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilters {
    pub action: String,
    pub target: String,
    pub target_type: String,
    pub actor: String,
}

impl EventFilters {
    pub fn from_options(options: &EventsOptions) -> Self {
        Self {
            action: options.action.clone().unwrap_or_default(),
            target: options.target.clone().unwrap_or_default(),
            target_type: options.target_type.clone().unwrap_or_default(),
            actor: options.actor.clone().unwrap_or_default(),
        }
    }

    pub fn matches(&self, event: &AuditEvent) -> bool {
        event.event_type.contains(&self.action)
            && event.target.name.contains(&self.target)
            && event.target.party_type.contains(&self.target_type)
            && event.actor.name.contains(&self.actor)
    }
}

/// Requested row limit, clamped to the API maximum. The flag is `true` when
/// clamping happened.
pub fn clamp_limit(requested: Option<u32>) -> (u32, bool) {
    match requested.unwrap_or(DEFAULT_EVENT_LIMIT) {
        0 => (DEFAULT_EVENT_LIMIT, false),
        limit if limit > MAX_EVENT_LIMIT => (MAX_EVENT_LIMIT, true),
        limit => (limit, false),
    }
}

/// Parsed `--since`/`--until` bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn parse(since: Option<&str>, until: Option<&str>) -> Result<Self, FilterError> {
        let since = since.map(parse_time_bound).transpose()?;
        let until = until.map(parse_time_bound).transpose()?;
        check_time_range(since.as_ref(), until.as_ref())?;
        Ok(Self { since, until })
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(since) = &self.since {
            query.push(("created_ats[gte]", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(until) = &self.until {
            query.push(("created_ats[lte]", until.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        query
    }
}

pub async fn run_events_report<W: Write>(ctx: &mut ReportContext<W>, options: &EventsOptions) -> Result<()> {
    let filters = EventFilters::from_options(options);
    let range = TimeRange::parse(options.since.as_deref(), options.until.as_deref())?;
    let (limit, clamped) = clamp_limit(options.limit);
    if clamped {
        writeln!(ctx.out(), "Output limited to {MAX_EVENT_LIMIT} rows")?;
    }

    let user = ctx.username();
    writeln!(ctx.out(), "Getting events as {}...\n", terminal::entity_name(&user))?;

    let mut query = vec![("per_page", limit.to_string()), ("order_by", "-created_at".to_string())];
    query.extend(scope_query(&ctx.client, &ctx.session, options.org.as_deref(), options.space.as_deref()).await?);
    query.extend(range.query());

    let page: ListResponse<AuditEvent> = get_json(&ctx.client, "/v3/audit_events", &query)
        .await
        .context("failed to list audit_events")?;
    if page.resources.is_empty() {
        writeln!(ctx.out(), "no audit_events found")?;
        return Ok(());
    }

    let table = events_table(page.resources, &filters);
    debug!(rows = table.len(), "audit events filtered");
    table.write_to(ctx.out())?;
    Ok(())
}

/// Sort events oldest first and keep those matching `filters`.
pub fn events_table(mut events: Vec<AuditEvent>, filters: &EventFilters) -> TextTable {
    events.sort_by_key(|event| event.created_at);

    let mut table = TextTable::new(EVENT_COLUMNS);
    for event in events.iter().filter(|event| filters.matches(event)) {
        let target = if event.target.name.is_empty() {
            MISSING_TARGET.to_string()
        } else {
            event.target.name.clone()
        };
        table.add_row([
            format_local_timestamp(event.created_at.as_ref()),
            event.event_type.clone(),
            target,
            event.target.party_type.clone(),
            event.actor.name.clone(),
        ]);
    }
    table
}

/// Server side org/space filter.
///
/// Org and space select the space within that org, org alone selects the
/// org, and space alone is looked up in the targeted org.
async fn scope_query(
    client: &CfClient,
    session: &Session,
    org: Option<&str>,
    space: Option<&str>,
) -> Result<Vec<(&'static str, String)>> {
    let org = org.filter(|name| !name.is_empty());
    let space = space.filter(|name| !name.is_empty());

    let query = match (org, space) {
        (Some(org), Some(space)) => {
            let org_guid = org_guid_by_name(client, org).await?;
            vec![("space_guids", space_guid_by_name(client, &org_guid, space).await?)]
        }
        (Some(org), None) => vec![("organization_guids", org_guid_by_name(client, org).await?)],
        (None, Some(space)) => {
            let targeted = session.organization.as_ref().ok_or(FilterError::SpaceWithoutOrg)?;
            vec![("space_guids", space_guid_by_name(client, &targeted.guid, space).await?)]
        }
        (None, None) => Vec::new(),
    };
    Ok(query)
}

async fn org_guid_by_name(client: &CfClient, name: &str) -> Result<String> {
    let page: ListResponse<Organization> = get_json(client, "/v3/organizations", &[("names", name.to_string())])
        .await
        .with_context(|| format!("failed to get org by name ({name})"))?;
    page.resources
        .into_iter()
        .next()
        .map(|org| org.guid)
        .ok_or_else(|| anyhow!("Org {name} not found"))
}

async fn space_guid_by_name(client: &CfClient, org_guid: &str, name: &str) -> Result<String> {
    let query = [("names", name.to_string()), ("organization_guids", org_guid.to_string())];
    let page: ListResponse<Space> = get_json(client, "/v3/spaces", &query)
        .await
        .with_context(|| format!("failed to get space by name ({name})"))?;
    page.resources
        .into_iter()
        .next()
        .map(|space| space.guid)
        .ok_or_else(|| anyhow!("Space {name} not found in org"))
}
