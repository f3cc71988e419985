//! `tb gantt`: the epic timeline of one domain.

use clap::Args;
use serde::Serialize;
use std::io::{self, Write};

use trackboard_core::chart::RetainedBackend;
use trackboard_core::gantt::{self, GanttLayout};
use trackboard_core::session::Dashboard;
use trackboard_core::store::GENERAL_SLUG;

use super::{Context, report};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Character cells used for the pretty timeline track.
const TRACK_WIDTH: usize = 40;

#[derive(Args, Debug, Default)]
pub struct GanttArgs {
    /// Domain slug.
    #[arg(long, default_value = GENERAL_SLUG)]
    pub domain: String,

    /// Only show epics in this status (`all` for every status).
    #[arg(long)]
    pub status: Option<String>,

    /// Only show this epic.
    #[arg(long)]
    pub epic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GanttReport {
    pub domain: String,
    pub pill: String,
    pub statuses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<GanttLayout>,
}

pub fn run_gantt(args: &GanttArgs, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.load_store(output)?;
    let statuses = gantt::statuses(store.gantt(&args.domain));
    let mut dash = Dashboard::new(store, ctx.config.clone(), ctx.today, RetainedBackend::new());

    dash.switch_tab(&args.domain).map_err(|e| report(output, e))?;
    if let Some(status) = &args.status {
        dash.set_gantt_filter(&args.domain, status.as_str())
            .map_err(|e| report(output, e))?;
    }
    if let Some(epic) = &args.epic {
        dash.set_epic(&args.domain, epic)
            .map_err(|e| report(output, e))?;
    }

    let session = dash.session(&args.domain).map_err(|e| report(output, e))?;
    let payload = GanttReport {
        domain: args.domain.clone(),
        pill: session.gantt_pill.to_string(),
        statuses,
        layout: dash
            .gantt_layout(&args.domain)
            .map_err(|e| report(output, e))?,
    };
    render_mode(output, &payload, render_text, render_pretty)
}

fn render_text(report: &GanttReport, w: &mut dyn Write) -> io::Result<()> {
    let Some(layout) = &report.layout else {
        return Ok(());
    };
    for bar in &layout.bars {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            bar.key,
            bar.start,
            bar.end,
            bar.status,
            bar.color.as_str()
        )?;
    }
    Ok(())
}

fn render_pretty(report: &GanttReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Timeline {}", report.domain))?;
    pretty_kv(w, "Showing", &report.pill)?;
    let Some(layout) = &report.layout else {
        writeln!(w, "  no epics with dates")?;
        return Ok(());
    };
    pretty_kv(
        w,
        "Window",
        format!("{} .. {}", layout.window_start, layout.window_end),
    )?;
    if let Some(today) = layout.today {
        pretty_kv(w, gantt::TODAY_LABEL, today.to_string())?;
    }
    writeln!(w)?;

    let today_cell = layout.today.map(|d| cell(layout.fraction(d)));
    for bar in &layout.bars {
        let from = cell(layout.fraction(bar.start));
        let to = cell(layout.fraction(bar.end)).max(from + 1);
        let track: String = (0..TRACK_WIDTH)
            .map(|i| {
                if (from..to).contains(&i) {
                    '='
                } else if today_cell == Some(i) {
                    '|'
                } else {
                    ' '
                }
            })
            .collect();
        writeln!(w, "  {:<12} [{track}] {}", bar.key, bar.status)?;
    }
    Ok(())
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn cell(fraction: f64) -> usize {
    let max = TRACK_WIDTH - 1;
    ((fraction.clamp(0.0, 1.0) * max as f64).round() as usize).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_span_the_track() {
        assert_eq!(cell(0.0), 0);
        assert_eq!(cell(1.0), TRACK_WIDTH - 1);
        assert_eq!(cell(2.0), TRACK_WIDTH - 1);
        assert_eq!(cell(-1.0), 0);
    }
}
