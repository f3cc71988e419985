#![forbid(unsafe_code)]

mod cmd;
mod output;
mod site;
mod tui;

use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use trackboard_core::config::resolve_config;
use trackboard_core::gantt::parse_date;
use trackboard_core::timing;

#[derive(Parser, Debug)]
#[command(
    name = "tb",
    author,
    version,
    about = "trackboard: delivery-metrics dashboard for issue trackers",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit command timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides `FORMAT` and the user config).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Dataset file (defaults to `[data] path` in the project config).
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Project root holding `.trackboard/config.toml` (defaults to the current directory).
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    /// Reference date for the today marker and effective end dates (YYYY-MM-DD).
    #[arg(long, global = true, value_parser = parse_date)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Output mode from flags alone; `None` defers to config and environment.
    fn output_flag(&self) -> Option<OutputMode> {
        if self.json {
            Some(OutputMode::Json)
        } else {
            self.format
        }
    }

    const fn is_interactive(&self) -> bool {
        matches!(self.command, Commands::Tui(_))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Dashboard",
        about = "Open the interactive dashboard",
        long_about = "Open the terminal dashboard: domain tabs, cross-filtering service and status panels, control charts, the epic timeline and the epic table.",
        after_help = "EXAMPLES:\n    # Open on the first domain\n    tb tui\n\n    # Open on a specific domain\n    tb tui --domain pagos"
    )]
    Tui(cmd::tui::TuiArgs),

    #[command(
        next_help_heading = "Dashboard",
        about = "Render the static HTML dashboard",
        long_about = "Render every domain into <output_dir>/index.html with inline SVG charts. Filter flags pre-apply filters to produce filtered snapshots.",
        after_help = "EXAMPLES:\n    # Build into the configured output directory\n    tb build\n\n    # Snapshot one service in one domain\n    tb build --domain pagos --service \"Checkout API\" -o snapshots/checkout"
    )]
    Build(cmd::build::BuildArgs),

    #[command(
        next_help_heading = "Dashboard",
        about = "Rebuild the site at fixed times of day",
        long_about = "Build once immediately, then rebuild once per day at each HH:MM time. Failed builds are logged and the schedule keeps running.",
        after_help = "EXAMPLES:\n    # Use the configured times\n    tb schedule\n\n    # Rebuild at 07:30 and 18:00\n    tb schedule 07:30 18:00"
    )]
    Schedule(cmd::schedule::ScheduleArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Aggregate one filtered domain",
        long_about = "Print the service and status distributions and the cycle/lead time control limits for one domain under the given filters.",
        after_help = "EXAMPLES:\n    # Whole portfolio\n    tb aggregate\n\n    # One week of one domain, as JSON\n    tb aggregate --domain pagos --week 2026-W02 --json"
    )]
    Aggregate(cmd::aggregate::AggregateArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Summarize the epic portfolio",
        long_about = "Print epic counts, distributions by status, domain, team, service, app, type and assignee, creation trends and the resolution rate.",
        after_help = "EXAMPLES:\n    tb summary\n    tb summary --top 5 --format text"
    )]
    Summary(cmd::summary::SummaryArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Show the epic timeline of a domain",
        long_about = "Print the timeline window, weekly ticks, today marker and one row per epic.",
        after_help = "EXAMPLES:\n    tb gantt --domain pagos\n    tb gantt --status Blocked --json"
    )]
    Gantt(cmd::gantt::GanttArgs),

    #[command(
        next_help_heading = "Reports",
        about = "List the week buckets of a domain",
        after_help = "EXAMPLES:\n    tb weeks --domain pagos"
    )]
    Weeks(cmd::weeks::WeeksArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    tb completions bash > ~/.local/share/bash-completion/completions/tb\n    tb completions fish -o ~/.config/fish/completions/tb.fish"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(cli: &Cli) {
    let default = if cli.quiet {
        "error"
    } else if env::var("DEBUG").is_ok() || cli.verbose {
        "trackboard=debug,info"
    } else if cli.is_interactive() {
        // the alternate screen owns the terminal
        "warn"
    } else {
        "trackboard=info,warn"
    };
    let filter = EnvFilter::try_from_env("TRACKBOARD_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    let format = env::var("TRACKBOARD_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let timing_enabled = cli.timing || timing::enabled_from_env();
    timing::set_enabled(timing_enabled);
    timing::reset();

    let project_root = match &cli.project {
        Some(root) => root.clone(),
        None => env::current_dir()?,
    };

    let effective = match resolve_config(&project_root, cli.json) {
        Ok(effective) => effective,
        Err(err) => {
            render_error(
                cli.output_flag().unwrap_or(OutputMode::Pretty),
                &CliError::from(&err),
            )?;
            return Err(err.into());
        }
    };
    let output = cli
        .output_flag()
        .unwrap_or_else(|| OutputMode::from_name(&effective.resolved_output));
    debug!(?output, root = %project_root.display(), "resolved output mode");
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let ctx = cmd::Context::new(
        &project_root,
        effective.project,
        cli.data.as_deref(),
        cli.today,
    );

    let command_result = match cli.command {
        Commands::Tui(ref args) => {
            timing::timed("cmd.tui", || cmd::tui::run_tui(args, output, &ctx))
        }
        Commands::Build(ref args) => {
            timing::timed("cmd.build", || cmd::build::run_build(args, output, &ctx))
        }
        Commands::Schedule(ref args) => timing::timed("cmd.schedule", || {
            cmd::schedule::run_schedule(args, output, &ctx)
        }),
        Commands::Aggregate(ref args) => timing::timed("cmd.aggregate", || {
            cmd::aggregate::run_aggregate(args, output, &ctx)
        }),
        Commands::Summary(ref args) => timing::timed("cmd.summary", || {
            cmd::summary::run_summary(args, output, &ctx)
        }),
        Commands::Gantt(ref args) => {
            timing::timed("cmd.gantt", || cmd::gantt::run_gantt(args, output, &ctx))
        }
        Commands::Weeks(ref args) => {
            timing::timed("cmd.weeks", || cmd::weeks::run_weeks(args, output, &ctx))
        }
        Commands::Completions(ref args) => timing::timed("cmd.completions", || {
            let mut command = Cli::command();
            cmd::completions::run_completions(args, &mut command)
        }),
    };

    if timing_enabled {
        let report = timing::take_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    command_result
}
