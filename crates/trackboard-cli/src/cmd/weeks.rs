//! `tb weeks`: week buckets present in a domain, newest first.

use clap::Args;
use serde::Serialize;
use std::io::{self, Write};

use trackboard_core::aggregate::Distribution;
use trackboard_core::store::GENERAL_SLUG;

use super::{Context, report};
use crate::output::{OutputMode, pretty_bar, pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct WeeksArgs {
    /// Domain slug.
    #[arg(long, default_value = GENERAL_SLUG)]
    pub domain: String,
}

#[derive(Debug, Serialize)]
pub struct WeekLine {
    pub week: String,
    pub issues: usize,
}

#[derive(Debug, Serialize)]
pub struct WeeksReport {
    pub domain: String,
    pub weeks: Vec<WeekLine>,
}

pub fn run_weeks(args: &WeeksArgs, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.load_store(output)?;
    store.domain(&args.domain).map_err(|e| report(output, e))?;

    let issues = store.issues(&args.domain);
    let counts = Distribution::count_by(issues, |i| i.week.as_str());
    let weeks = store
        .weeks(&args.domain)
        .into_iter()
        .map(|week| WeekLine {
            issues: counts.get(&week).unwrap_or(0),
            week,
        })
        .collect();

    let payload = WeeksReport {
        domain: args.domain.clone(),
        weeks,
    };
    render_mode(output, &payload, render_text, render_pretty)
}

fn render_text(report: &WeeksReport, w: &mut dyn Write) -> io::Result<()> {
    for line in &report.weeks {
        writeln!(w, "{}\t{}", line.week, line.issues)?;
    }
    Ok(())
}

fn render_pretty(report: &WeeksReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Weeks in {}", report.domain))?;
    if report.weeks.is_empty() {
        writeln!(w, "  no weeks recorded")?;
        return Ok(());
    }
    let max = report.weeks.iter().map(|l| l.issues).max().unwrap_or(0);
    for line in &report.weeks {
        writeln!(
            w,
            "  {:<12} {:>5} {}",
            line.week,
            line.issues,
            pretty_bar(line.issues, max, 40)
        )?;
    }
    Ok(())
}
