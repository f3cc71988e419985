//! Timeline layout for epic bars.
//!
//! The layout is backend-neutral: dates, ticks and labels. The SVG site and
//! the terminal panel both project it onto their own coordinate space.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::config::GanttConfig;
use crate::error::{Result, TrackboardError};
use crate::model::{GanttColor, GanttEntry};

/// Label drawn next to the today marker.
pub const TODAY_LABEL: &str = "TODAY";

/// Status pill restricting which bars are drawn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GanttPill {
    #[default]
    All,
    Status(String),
}

impl GanttPill {
    #[must_use]
    pub fn admits(&self, entry: &GanttEntry) -> bool {
        match self {
            Self::All => true,
            Self::Status(status) => entry.status == *status,
        }
    }

    /// The pill after this one, cycling `all → s1 → s2 → … → all`.
    #[must_use]
    pub fn next(&self, statuses: &[String]) -> Self {
        let position = match self {
            Self::All => None,
            Self::Status(current) => statuses.iter().position(|s| s == current),
        };
        let next = position.map_or(0, |i| i + 1);
        statuses
            .get(next)
            .map_or(Self::All, |s| Self::Status(s.clone()))
    }
}

impl From<&str> for GanttPill {
    fn from(value: &str) -> Self {
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Status(value.to_string())
        }
    }
}

impl fmt::Display for GanttPill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Status(status) => f.write_str(status),
        }
    }
}

/// Distinct statuses in first-seen order, used to offer pills.
#[must_use]
pub fn statuses(entries: &[GanttEntry]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for entry in entries {
        if !entry.status.is_empty() && !out.contains(&entry.status) {
            out.push(entry.status.clone());
        }
    }
    out
}

/// Entries admitted by the pill and, when set, the epic filter.
#[must_use]
pub fn visible<'a>(
    entries: &'a [GanttEntry],
    pill: &GanttPill,
    epic_key: Option<&str>,
) -> Vec<&'a GanttEntry> {
    entries
        .iter()
        .filter(|e| pill.admits(e))
        .filter(|e| epic_key.is_none_or(|key| e.key == key))
        .collect()
}

/// Parse an ISO `YYYY-MM-DD` date (a trailing time part is ignored).
///
/// # Errors
///
/// Returns [`TrackboardError::InvalidDate`] when the text is not a date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    value
        .get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        .ok_or_else(|| TrackboardError::InvalidDate {
            value: value.to_string(),
        })
}

/// `"<key> — <summary>"`, cut to `max_chars` characters plus `...`.
#[must_use]
pub fn bar_label(entry: &GanttEntry, max_chars: usize) -> String {
    let full = format!("{} \u{2014} {}", entry.key, entry.summary);
    if full.chars().count() > max_chars {
        let mut cut: String = full.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    } else {
        full
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GanttBar {
    pub key: String,
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub color: GanttColor,
    pub status: String,
    pub assignee: String,
    pub planned_done: String,
    pub due: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GanttLayout {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    /// Weekly ticks starting at the window start.
    pub ticks: Vec<NaiveDate>,
    /// Set only when today lies inside the window.
    pub today: Option<NaiveDate>,
    pub bars: Vec<GanttBar>,
    /// Pixel height for graphical backends.
    pub height: u32,
}

impl GanttLayout {
    /// Lay out `entries`. Returns `None` when no entry has usable dates.
    #[must_use]
    pub fn build(entries: &[&GanttEntry], today: NaiveDate, cfg: &GanttConfig) -> Option<Self> {
        let mut bars = Vec::with_capacity(entries.len());
        for entry in entries {
            let (Ok(start), Ok(end)) = (parse_date(&entry.start), parse_date(&entry.end)) else {
                warn!(key = %entry.key, start = %entry.start, end = %entry.end, "skipping bar with unparsable dates");
                continue;
            };
            bars.push(GanttBar {
                key: entry.key.clone(),
                label: bar_label(entry, cfg.label_max_chars),
                start,
                end,
                color: entry.color,
                status: entry.status.clone(),
                assignee: entry.assignee.clone(),
                planned_done: entry.planned_done.clone(),
                due: entry.due.clone(),
            });
        }

        let min = bars.iter().flat_map(|b| [b.start, b.end]).min()?;
        let max = bars.iter().flat_map(|b| [b.start, b.end]).max()?;
        let window = Duration::try_days(cfg.pad_before_days)
            .and_then(|pad| min.checked_sub_signed(pad))
            .zip(Duration::try_days(cfg.pad_after_days).and_then(|pad| max.checked_add_signed(pad)));
        let Some((window_start, window_end)) = window else {
            warn!(
                pad_before = cfg.pad_before_days,
                pad_after = cfg.pad_after_days,
                "timeline padding leaves the calendar range"
            );
            return None;
        };

        let ticks = std::iter::successors(Some(window_start), |d| {
            d.checked_add_signed(Duration::weeks(1))
        })
        .take_while(|d| *d <= window_end)
        .collect();

        let rows = u32::try_from(bars.len()).unwrap_or(u32::MAX);
        let height = rows
            .saturating_mul(cfg.row_height)
            .saturating_add(60)
            .max(cfg.min_height);

        Some(Self {
            window_start,
            window_end,
            ticks,
            today: (window_start..=window_end).contains(&today).then_some(today),
            bars,
            height,
        })
    }

    #[must_use]
    pub fn span_days(&self) -> i64 {
        (self.window_end - self.window_start).num_days()
    }

    /// Position of `date` across the window, 0.0 at the start and 1.0 at the end.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self, date: NaiveDate) -> f64 {
        let span = self.span_days();
        if span <= 0 {
            return 0.0;
        }
        (date - self.window_start).num_days() as f64 / span as f64
    }
}
