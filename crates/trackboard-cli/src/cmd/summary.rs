//! `tb summary`: portfolio metrics over the dataset's epics.

use clap::Args;
use serde::Serialize;
use std::io::{self, Write};

use trackboard_core::aggregate::Distribution;
use trackboard_core::epics::{self, EpicSummary};

use super::Context;
use crate::output::{OutputMode, pretty_bar, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct SummaryArgs {
    /// Show at most this many entries per distribution.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Debug, Serialize)]
pub struct DomainLine {
    pub slug: String,
    pub name: String,
    pub issues: usize,
    pub epics_in_timeline: usize,
}

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    pub total_issues: usize,
    pub domains: Vec<DomainLine>,
    pub epics: EpicSummary,
    #[serde(skip)]
    pub top: usize,
}

pub fn run_summary(args: &SummaryArgs, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.load_store(output)?;
    let (_, summary) = epics::summarize(store.epics(), &ctx.config.epics, ctx.today);

    let payload = SummaryReport {
        generated_at: store.generated_at().map(str::to_string),
        total_issues: store.total_issues(),
        domains: store
            .domains()
            .iter()
            .map(|d| DomainLine {
                slug: d.slug.clone(),
                name: d.name.clone(),
                issues: store.issues(&d.slug).len(),
                epics_in_timeline: store.gantt(&d.slug).len(),
            })
            .collect(),
        epics: summary,
        top: args.top,
    };
    render_mode(output, &payload, render_text, render_pretty)
}

fn render_text(report: &SummaryReport, w: &mut dyn Write) -> io::Result<()> {
    let e = &report.epics;
    writeln!(w, "total_issues\t{}", report.total_issues)?;
    writeln!(w, "total_raw\t{}", e.total_raw)?;
    writeln!(w, "total_epics\t{}", e.total_epics)?;
    writeln!(w, "active\t{}", e.active)?;
    writeln!(w, "blocked\t{}", e.blocked)?;
    writeln!(w, "done_recent\t{}", e.done_recent)?;
    writeln!(w, "resolution_rate_pct\t{:.1}", e.resolution.rate_pct)?;
    for d in &report.domains {
        writeln!(w, "domain\t{}\t{}\t{}", d.slug, d.issues, d.epics_in_timeline)?;
    }
    for (name, dist) in named_distributions(e) {
        for (label, count) in dist.entries().iter().take(report.top) {
            writeln!(w, "{name}\t{label}\t{count}")?;
        }
    }
    Ok(())
}

fn render_pretty(report: &SummaryReport, w: &mut dyn Write) -> io::Result<()> {
    let e = &report.epics;
    pretty_section(w, "Portfolio")?;
    if let Some(at) = &report.generated_at {
        pretty_kv(w, "Generated", at)?;
    }
    pretty_kv(w, "Issues", report.total_issues.to_string())?;
    pretty_kv(
        w,
        "Epics",
        format!("{} of {} (cutoff {})", e.total_epics, e.total_raw, e.cutoff_date),
    )?;
    pretty_kv(w, "In progress", e.active.to_string())?;
    pretty_kv(w, "Blocked", e.blocked.to_string())?;
    pretty_kv(w, "Done recently", e.done_recent.to_string())?;
    pretty_kv(
        w,
        "Resolved",
        format!(
            "{}/{} ({:.1}%)",
            e.resolution.resolved, e.resolution.total, e.resolution.rate_pct
        ),
    )?;
    writeln!(w)?;

    pretty_section(w, "Domains")?;
    for d in &report.domains {
        writeln!(
            w,
            "  {:<20} {:<24} {:>6} issues {:>4} epics",
            d.slug, d.name, d.issues, d.epics_in_timeline
        )?;
    }
    writeln!(w)?;

    for (name, dist) in named_distributions(e) {
        if dist.is_empty() {
            continue;
        }
        pretty_section(w, name)?;
        let max = dist.values().max().unwrap_or(0);
        for (label, count) in dist.entries().iter().take(report.top) {
            writeln!(w, "  {label:<28} {count:>4} {}", pretty_bar(*count, max, 24))?;
        }
        writeln!(w)?;
    }

    if !e.monthly.is_empty() {
        pretty_section(w, "Created per month")?;
        for (month, count) in &e.monthly {
            writeln!(w, "  {month}  {count:>4}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn named_distributions(e: &EpicSummary) -> [(&'static str, &Distribution); 7] {
    [
        ("status", &e.status_dist),
        ("domain", &e.domain_dist),
        ("team", &e.team_dist),
        ("service", &e.service_dist),
        ("app", &e.app_dist),
        ("type", &e.kind_dist),
        ("assignee", &e.assignee_dist),
    ]
}
