//! The routes report (`lr`): every route with a given hostname, with the
//! domain, org, space and apps it belongs to.

use std::collections::HashMap;
use std::io::Write;

use anyhow::{Context, Result, anyhow};
use panzer_api::{CfClient, TargetRef};
use panzer_types::{App, Domain, Organization, Route, Space};
use panzer_util::http::{get_resource, list_all};
use panzer_util::{TextTable, terminal};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::context::ReportContext;

const ROUTES_PAGE_SIZE: &str = "100";
const ROUTE_COLUMNS: [&str; 5] = ["hostname", "domain", "org", "space", "bound apps"];

#[derive(Debug, Clone, Default)]
pub struct RoutesOptions {
    pub hostname: String,
    /// Target the org and space of the (last) route found.
    pub switch_target: bool,
}

pub async fn run_routes_report<W: Write>(ctx: &mut ReportContext<W>, options: &RoutesOptions) -> Result<()> {
    let user = ctx.username();
    writeln!(
        ctx.out(),
        "Getting routes for hostname {} as {}...\n",
        terminal::entity_name(&options.hostname),
        terminal::entity_name(&user)
    )?;

    let query = [("hosts", options.hostname.clone()), ("per_page", ROUTES_PAGE_SIZE.to_string())];
    let routes: Vec<Route> = list_all(&ctx.client, "/v3/routes", &query)
        .await
        .context("failed to list routes")?;
    if routes.is_empty() {
        writeln!(ctx.out(), "no routes found for hostname {}", options.hostname)?;
        return Ok(());
    }

    let mut lookup = RouteLookup::new(&ctx.client);
    let mut table = TextTable::new(ROUTE_COLUMNS);
    let mut last_target = None;
    for route in &routes {
        let row = lookup.resolve(route).await?;
        table.add_row([
            options.hostname.clone(),
            row.domain,
            row.organization.name.clone(),
            row.space.name.clone(),
            row.bound_apps.join(" "),
        ]);
        last_target = Some((row.organization, row.space));
    }
    debug!(routes = routes.len(), lookups = lookup.fetched(), "routes resolved");
    table.write_to(ctx.out())?;

    if options.switch_target
        && let Some((organization, space)) = last_target
    {
        ctx.session
            .switch_target(organization.clone(), space.clone())
            .with_context(|| format!("failed to set target to org {} and space {}", organization.name, space.name))?;
        writeln!(
            ctx.out(),
            "\nTargeted org {} / space {}",
            terminal::entity_name(&organization.name),
            terminal::entity_name(&space.name)
        )?;
    }
    Ok(())
}

/// A route with its related resources resolved to names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub domain: String,
    pub organization: TargetRef,
    pub space: TargetRef,
    pub bound_apps: Vec<String>,
}

/// Resolves route relationships, fetching each domain, space, org and app
/// at most once per invocation.
pub struct RouteLookup<'a> {
    client: &'a CfClient,
    domains: HashMap<String, Domain>,
    spaces: HashMap<String, Space>,
    organizations: HashMap<String, Organization>,
    apps: HashMap<String, App>,
}

impl<'a> RouteLookup<'a> {
    pub fn new(client: &'a CfClient) -> Self {
        Self {
            client,
            domains: HashMap::new(),
            spaces: HashMap::new(),
            organizations: HashMap::new(),
            apps: HashMap::new(),
        }
    }

    /// Number of distinct resources fetched so far.
    pub fn fetched(&self) -> usize {
        self.domains.len() + self.spaces.len() + self.organizations.len() + self.apps.len()
    }

    pub async fn resolve(&mut self, route: &Route) -> Result<ResolvedRoute> {
        let domain_guid = route
            .relationships
            .domain
            .guid()
            .ok_or_else(|| anyhow!("route {} has no domain", route.guid))?;
        let domain = cached(self.client, &mut self.domains, "domains", domain_guid).await?.name.clone();

        let space_guid = route
            .relationships
            .space
            .guid()
            .ok_or_else(|| anyhow!("route {} has no space", route.guid))?;
        let space = cached(self.client, &mut self.spaces, "spaces", space_guid).await?.clone();

        let organization_guid = space
            .organization_guid()
            .ok_or_else(|| anyhow!("space {} has no organization", space.name))?;
        let organization = cached(self.client, &mut self.organizations, "organizations", organization_guid)
            .await?
            .name
            .clone();

        let mut bound_apps: Vec<String> = Vec::new();
        for destination in &route.destinations {
            if destination.app.guid.is_empty() {
                continue;
            }
            let name = &cached(self.client, &mut self.apps, "apps", &destination.app.guid).await?.name;
            if !bound_apps.contains(name) {
                bound_apps.push(name.clone());
            }
        }

        Ok(ResolvedRoute {
            domain,
            organization: TargetRef::new(organization_guid, organization),
            space: TargetRef::new(space.guid.clone(), space.name.clone()),
            bound_apps,
        })
    }
}

async fn cached<'c, T: DeserializeOwned>(
    client: &CfClient,
    cache: &'c mut HashMap<String, T>,
    collection: &str,
    guid: &str,
) -> Result<&'c T> {
    if !cache.contains_key(guid) {
        let resource: T = get_resource(client, collection, guid)
            .await
            .with_context(|| format!("failed to get {collection} {guid}"))?;
        cache.insert(guid.to_string(), resource);
    }
    cache
        .get(guid)
        .ok_or_else(|| anyhow!("{collection} {guid} missing from cache"))
}
