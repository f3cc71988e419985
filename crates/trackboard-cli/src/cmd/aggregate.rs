//! `tb aggregate`: distributions and control limits for one filtered domain.

use clap::Args;
use serde::Serialize;
use std::io::{self, Write};

use trackboard_core::aggregate::{AggregateResult, ControlSeries, Distribution};
use trackboard_core::chart::RetainedBackend;
use trackboard_core::filter::{Filter, FilterBadge};
use trackboard_core::session::Dashboard;
use trackboard_core::store::GENERAL_SLUG;

use super::{Context, FilterArgs, report};
use crate::output::{OutputMode, pretty_bar, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct AggregateArgs {
    /// Domain slug.
    #[arg(long, default_value = GENERAL_SLUG)]
    pub domain: String,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Debug, Serialize)]
pub struct AggregateReport {
    pub domain: String,
    pub filter: Filter,
    pub badges: Vec<String>,
    #[serde(flatten)]
    pub result: AggregateResult,
}

pub fn run_aggregate(args: &AggregateArgs, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.load_store(output)?;
    let mut dash = Dashboard::new(store, ctx.config.clone(), ctx.today, RetainedBackend::new());

    dash.switch_tab(&args.domain).map_err(|e| report(output, e))?;
    args.filter
        .apply(&mut dash, &args.domain)
        .map_err(|e| report(output, e))?;

    let session = dash.session(&args.domain).map_err(|e| report(output, e))?;
    let payload = AggregateReport {
        domain: args.domain.clone(),
        filter: session.filter.clone(),
        badges: session.filter.badges().iter().map(FilterBadge::to_string).collect(),
        result: session.aggregate.clone().unwrap_or_else(empty_result),
    };
    render_mode(output, &payload, render_text, render_pretty)
}

fn empty_result() -> AggregateResult {
    let series = || ControlSeries {
        points: Vec::new(),
        mean: 0.0,
        ucl: 0.0,
        lcl: 0.0,
    };
    AggregateResult {
        issue_count: 0,
        service: Distribution::default(),
        status: Distribution::default(),
        cycle_time: series(),
        lead_time: series(),
    }
}

fn render_text(report: &AggregateReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "issues\t{}", report.result.issue_count)?;
    for (label, count) in report.result.service.entries() {
        writeln!(w, "service\t{label}\t{count}")?;
    }
    for (label, count) in report.result.status.entries() {
        writeln!(w, "status\t{label}\t{count}")?;
    }
    for (name, series) in [
        ("cycle_time", &report.result.cycle_time),
        ("lead_time", &report.result.lead_time),
    ] {
        writeln!(
            w,
            "{name}\tn={}\tmean={:.1}\tucl={:.1}\tlcl={:.1}",
            series.points.len(),
            series.mean,
            series.ucl,
            series.lcl
        )?;
    }
    Ok(())
}

fn render_pretty(report: &AggregateReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Domain {}", report.domain))?;
    pretty_kv(w, "Issues", report.result.issue_count.to_string())?;
    if !report.badges.is_empty() {
        pretty_kv(w, "Filters", report.badges.join(", "))?;
    }
    writeln!(w)?;
    distribution_block(w, "By service", &report.result.service)?;
    distribution_block(w, "By status", &report.result.status)?;
    for (title, series) in [
        ("Cycle time (days)", &report.result.cycle_time),
        ("Lead time (days)", &report.result.lead_time),
    ] {
        pretty_section(w, title)?;
        if series.is_empty() {
            writeln!(w, "  no data")?;
        } else {
            pretty_kv(w, "Points", series.points.len().to_string())?;
            pretty_kv(w, "Mean", format!("{:.1}", series.mean))?;
            pretty_kv(w, "UCL", format!("{:.1}", series.ucl))?;
            pretty_kv(w, "LCL", format!("{:.1}", series.lcl))?;
            let outliers = series.points.iter().filter(|p| p.y > series.ucl).count();
            pretty_kv(w, "Above UCL", outliers.to_string())?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn distribution_block(w: &mut dyn Write, title: &str, dist: &Distribution) -> io::Result<()> {
    pretty_section(w, title)?;
    if dist.is_empty() {
        writeln!(w, "  no data")?;
    }
    let max = dist.values().max().unwrap_or(0);
    for (label, count) in dist.entries() {
        writeln!(w, "  {label:<28} {count:>5} {}", pretty_bar(*count, max, 30))?;
    }
    writeln!(w)
}
