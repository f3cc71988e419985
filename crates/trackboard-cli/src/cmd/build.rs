//! `tb build`: render the static dashboard page.

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

use trackboard_core::error::TrackboardError;
use trackboard_core::session::Dashboard;
use trackboard_core::store::{Dataset, IssueStore};
use trackboard_core::timing;

use super::{Context, FilterArgs, report, write_file};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use crate::site::{self, SvgBackend};

#[derive(Args, Debug, Default, Clone)]
pub struct BuildArgs {
    /// Directory to write `index.html` into (defaults to `[site] output_dir`).
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Restrict the filter flags to one domain; without it they apply to every domain.
    #[arg(long)]
    pub domain: Option<String>,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub path: PathBuf,
    pub bytes: usize,
    pub domains: usize,
    pub issues: usize,
    pub epics: usize,
    pub charts: usize,
}

pub fn run_build(args: &BuildArgs, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let payload = build_site(args, ctx).map_err(|err| report_any(output, err))?;
    render_mode(output, &payload, render_text, render_pretty)
}

/// Like [`report`], for errors that may or may not be library errors.
pub fn report_any(output: OutputMode, err: anyhow::Error) -> anyhow::Error {
    match err.downcast::<TrackboardError>() {
        Ok(typed) => report(output, typed),
        Err(other) => other,
    }
}

/// Load, build every domain, apply the filter flags and write the page.
///
/// # Errors
///
/// Returns an error when the dataset cannot be loaded, a domain is unknown or
/// the page cannot be written.
pub fn build_site(args: &BuildArgs, ctx: &Context) -> anyhow::Result<BuildReport> {
    let dataset = Dataset::load(&ctx.data_path)?;
    let store = IssueStore::from_dataset(dataset, &ctx.config, ctx.today);
    let mut dash = Dashboard::new(store, ctx.config.clone(), ctx.today, SvgBackend::new());

    let slugs = dash.slugs().to_vec();
    for slug in &slugs {
        dash.switch_tab(slug)?;
    }
    if !args.filter.is_empty() {
        match &args.domain {
            Some(slug) => args.filter.apply(&mut dash, slug)?,
            None => {
                for slug in &slugs {
                    args.filter.apply(&mut dash, slug)?;
                }
            }
        }
    } else if let Some(slug) = &args.domain {
        dash.session(slug)?;
    }

    let (html, stats) = timing::timed("site.render", || site::render(&dash))?;
    let dir = ctx.resolve(args.output_dir.as_deref().unwrap_or(&ctx.config.site.output_dir));
    let path = dir.join("index.html");
    write_file(&path, &html).with_context(|| format!("building {}", path.display()))?;

    info!(
        path = %path.display(),
        bytes = html.len(),
        domains = stats.domains,
        issues = stats.issues,
        "site built"
    );
    Ok(BuildReport {
        path,
        bytes: html.len(),
        domains: stats.domains,
        issues: stats.issues,
        epics: stats.epics,
        charts: stats.charts,
    })
}

fn render_text(report: &BuildReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}",
        report.path.display(),
        report.bytes,
        report.domains,
        report.issues,
        report.epics
    )
}

fn render_pretty(report: &BuildReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Site built")?;
    pretty_kv(w, "Domains", report.domains.to_string())?;
    pretty_kv(w, "Issues", report.issues.to_string())?;
    pretty_kv(w, "Epics", report.epics.to_string())?;
    pretty_kv(w, "Charts", report.charts.to_string())?;
    pretty_kv(
        w,
        "Written",
        format!("{} ({:.1} KB)", report.path.display(), kilobytes(report.bytes)),
    )
}

#[allow(clippy::cast_precision_loss)]
fn kilobytes(bytes: usize) -> f64 {
    bytes as f64 / 1024.0
}
