use serde::Serialize;

use crate::aggregate::{AggregateResult, ControlSeries, Distribution};
use crate::gantt::GanttLayout;

pub const BLUE: &str = "#0053e2";
pub const GREEN: &str = "#2a8703";
pub const RED: &str = "#ea1100";
pub const YELLOW: &str = "#ffc220";
pub const MEAN_COLOR: &str = "#000000";
pub const CYCLE_TIME_COLOR: &str = "#6366f1";
pub const LEAD_TIME_COLOR: &str = "#f97316";

/// Categorical palette, reused cyclically.
pub const PALETTE: [&str; 12] = [
    "#0053e2", "#2a8703", "#ea1100", "#ffc220", "#6366f1", "#06b6d4", "#8b5cf6", "#f97316",
    "#ec4899", "#14b8a6", "#a855f7", "#0891b2",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub colors: Vec<String>,
    pub horizontal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoughnutChart {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub colors: Vec<String>,
}

/// One raw-value bar of a control chart, already tier-coloured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlBar {
    pub x: String,
    pub key: String,
    pub y: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub name: &'static str,
    pub value: f64,
    pub color: &'static str,
    /// Stroke dash pattern as (dash, gap) lengths.
    pub dash: (u8, u8),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlChart {
    pub bars: Vec<ControlBar>,
    /// Mean, UCL and LCL, in that order.
    pub lines: [ReferenceLine; 3],
}

impl ControlChart {
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.bars
            .iter()
            .map(|b| b.y)
            .chain(self.lines.iter().map(|l| l.value))
            .fold(0.0, f64::max)
    }
}

/// Everything a backend needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartSpec {
    Bar(BarChart),
    Doughnut(DoughnutChart),
    Control(ControlChart),
    Gantt(GanttLayout),
}

impl ChartSpec {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bar(_) => "bar",
            Self::Doughnut(_) => "doughnut",
            Self::Control(_) => "control",
            Self::Gantt(_) => "gantt",
        }
    }

    /// Bar chart over a distribution, or `None` when it has no categories.
    ///
    /// The chart turns horizontal past `threshold` categories or when asked.
    #[must_use]
    pub fn bar(dist: &Distribution, colors: &[&str], horizontal: bool, threshold: usize) -> Option<Self> {
        if dist.is_empty() {
            return None;
        }
        Some(Self::Bar(BarChart {
            labels: dist.labels().map(str::to_string).collect(),
            values: counts(dist),
            colors: cycle_colors(colors, dist.len()),
            horizontal: horizontal || dist.len() > threshold,
        }))
    }

    #[must_use]
    pub fn doughnut(dist: &Distribution, colors: &[&str]) -> Option<Self> {
        if dist.is_empty() {
            return None;
        }
        Some(Self::Doughnut(DoughnutChart {
            labels: dist.labels().map(str::to_string).collect(),
            values: counts(dist),
            colors: cycle_colors(colors, dist.len()),
        }))
    }

    /// Control chart in `color`, or `None` when the series has no points.
    #[must_use]
    pub fn control(series: &ControlSeries, color: &str) -> Option<Self> {
        if series.is_empty() {
            return None;
        }
        let bars = series
            .points
            .iter()
            .map(|p| ControlBar {
                x: p.x.clone(),
                key: p.key.clone(),
                y: p.y,
                color: tier_color(p.y, series, color),
            })
            .collect();
        Some(Self::Control(ControlChart {
            bars,
            lines: [
                ReferenceLine {
                    name: "mean",
                    value: series.mean,
                    color: MEAN_COLOR,
                    dash: (6, 3),
                },
                ReferenceLine {
                    name: "ucl",
                    value: series.ucl,
                    color: RED,
                    dash: (4, 4),
                },
                ReferenceLine {
                    name: "lcl",
                    value: series.lcl,
                    color: GREEN,
                    dash: (4, 4),
                },
            ],
        }))
    }
}

/// Alarm colour above the UCL, mid tint above the mean, base tint otherwise.
#[must_use]
pub fn tier_color(value: f64, series: &ControlSeries, base: &str) -> String {
    if value > series.ucl {
        RED.to_string()
    } else if value > series.mean {
        format!("{base}99")
    } else {
        format!("{base}66")
    }
}

fn counts(dist: &Distribution) -> Vec<f64> {
    #[allow(clippy::cast_precision_loss)]
    dist.values().map(|v| v as f64).collect()
}

fn cycle_colors(colors: &[&str], n: usize) -> Vec<String> {
    if colors.is_empty() {
        return vec![BLUE.to_string(); n];
    }
    colors.iter().cycle().take(n).map(|c| (*c).to_string()).collect()
}

/// The four metric charts of one aggregate, in target order.
#[must_use]
pub fn metric_charts(agg: &AggregateResult, threshold: usize) -> [Option<ChartSpec>; 4] {
    [
        ChartSpec::bar(&agg.service, &[BLUE], true, threshold),
        ChartSpec::doughnut(&agg.status, &PALETTE),
        ChartSpec::control(&agg.cycle_time, CYCLE_TIME_COLOR),
        ChartSpec::control(&agg.lead_time, LEAD_TIME_COLOR),
    ]
}
