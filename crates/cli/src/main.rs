use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use panzer_api::Session;
use panzer_engine::{
    AppsOptions, EventsOptions, ReportContext, ReportSettings, RoutesOptions, run_apps_report, run_events_report,
    run_routes_report,
};
use panzer_util::terminal;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "panzer",
    version,
    about = "Reports on apps, routes and audit events of the logged-in Cloud Foundry session"
)]
struct Cli {
    /// Never color the output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apps and processes of the targeted space (columns via CF_COLS)
    #[command(name = "aa", visible_alias = "apps")]
    Apps(AppsArgs),

    /// All routes for a hostname, with their domain, org, space and apps
    #[command(name = "lr", visible_alias = "routes")]
    Routes(RoutesArgs),

    /// Recent audit events, oldest first
    #[command(name = "ev", visible_alias = "events")]
    Events(EventsArgs),
}

#[derive(Debug, Args)]
struct AppsArgs {
    /// Only report apps whose name matches this regular expression
    #[arg(short = 'a', long = "appname", value_name = "REGEX")]
    name_filter: Option<String>,

    /// Omit the banner, headers and totals
    #[arg(short = 'q', long)]
    hide_headers: bool,

    /// Append the space quota usage
    #[arg(short = 'u', long)]
    show_quota_usage: bool,
}

#[derive(Debug, Args)]
struct RoutesArgs {
    /// Target the org and space of the route found
    #[arg(short = 't', long = "target")]
    switch_target: bool,

    hostname: String,
}

#[derive(Debug, Args)]
struct EventsArgs {
    /// Maximum number of events requested, at most 5000
    #[arg(short = 'l', long)]
    limit: Option<u32>,

    /// Only events whose action contains this text
    #[arg(short = 'a', long)]
    action: Option<String>,

    /// Only events whose target name contains this text
    #[arg(short = 't', long)]
    target: Option<String>,

    /// Only events whose target type contains this text
    #[arg(short = 'y', long = "type")]
    target_type: Option<String>,

    /// Only events whose actor name contains this text
    #[arg(short = 'c', long)]
    actor: Option<String>,

    /// Only events of this org
    #[arg(short = 'o', long)]
    org: Option<String>,

    /// Only events of this space (in --org or the targeted org)
    #[arg(short = 's', long)]
    space: Option<String>,

    /// Events created at or after this time
    #[arg(long, value_name = "TIME")]
    since: Option<String>,

    /// Events created at or before this time
    #[arg(long, value_name = "TIME")]
    until: Option<String>,
}

impl From<AppsArgs> for AppsOptions {
    fn from(args: AppsArgs) -> Self {
        Self {
            name_filter: args.name_filter,
            hide_headers: args.hide_headers,
            show_quota_usage: args.show_quota_usage,
        }
    }
}

impl From<RoutesArgs> for RoutesOptions {
    fn from(args: RoutesArgs) -> Self {
        Self {
            hostname: args.hostname,
            switch_target: args.switch_target,
        }
    }
}

impl From<EventsArgs> for EventsOptions {
    fn from(args: EventsArgs) -> Self {
        Self {
            limit: args.limit,
            action: args.action,
            target: args.target,
            target_type: args.target_type,
            actor: args.actor,
            org: args.org,
            space: args.space,
            since: args.since,
            until: args.until,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    if cli.no_color {
        terminal::set_colors_enabled(false);
    }

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = io::stdout().flush();
            report_failure(&error, cli.no_color);
            ExitCode::FAILURE
        }
    }
}

/// Print the error chain on stderr, colored according to stderr itself.
fn report_failure(error: &anyhow::Error, no_color: bool) {
    terminal::set_colors_enabled(!no_color && terminal::colors_enabled_for(io::stderr().is_terminal()));
    eprintln!("{}", terminal::failure(&format!("{error:#}")));
}

/// Diagnostics go to stderr so report tables on stdout stay clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

async fn run(command: Command) -> Result<()> {
    let settings = ReportSettings::from_env()?;
    let session = Session::load()?;
    debug!(api = %session.api_endpoint, "session ready");
    let mut ctx = ReportContext::new(session, settings, io::stdout().lock())?;

    match command {
        Command::Apps(args) => run_apps_report(&mut ctx, &args.into()).await?,
        Command::Routes(args) => run_routes_report(&mut ctx, &args.into()).await?,
        Command::Events(args) => run_events_report(&mut ctx, &args.into()).await?,
    }
    ctx.out().flush()?;
    Ok(())
}
