//! Inline SVG rendering of chart specs for the static site.

use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt::Write as _;

use trackboard_core::chart::spec::{BarChart, DoughnutChart, RED};
use trackboard_core::chart::{ChartBackend, ChartSpec, ControlChart};
use trackboard_core::gantt::{GanttLayout, TODAY_LABEL};

use super::escape;

const CHART_WIDTH: f64 = 480.0;
const CHART_HEIGHT: f64 = 280.0;
const MARGIN: f64 = 36.0;
const GANTT_WIDTH: f64 = 1100.0;
const GANTT_LABEL_WIDTH: f64 = 360.0;
const GANTT_HEADER: f64 = 40.0;
const GRID: &str = "#e5e7eb";
const INK: &str = "#374151";

/// Keeps the markup of every live chart, keyed by target id.
#[derive(Debug, Default)]
pub struct SvgBackend {
    live: BTreeMap<String, String>,
    released: u64,
}

impl SvgBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markup currently shown in `target`.
    pub fn get(&self, target: &str) -> Option<&str> {
        self.live.get(target).map(String::as_str)
    }

    pub const fn released(&self) -> u64 {
        self.released
    }
}

impl ChartBackend for SvgBackend {
    type Handle = String;

    fn build(&mut self, target: &str, spec: &ChartSpec) -> String {
        self.live.insert(target.to_string(), render(spec));
        target.to_string()
    }

    fn release(&mut self, target: &str, handle: String) {
        debug_assert_eq!(target, handle);
        self.live.remove(target);
        self.released += 1;
    }
}

pub fn render(spec: &ChartSpec) -> String {
    match spec {
        ChartSpec::Bar(bar) => bar_svg(bar),
        ChartSpec::Doughnut(d) => doughnut_svg(d),
        ChartSpec::Control(c) => control_svg(c),
        ChartSpec::Gantt(g) => gantt_svg(g),
    }
}

#[allow(clippy::cast_precision_loss)]
fn px(n: usize) -> f64 {
    n as f64
}

fn open(width: f64, height: f64) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}" viewBox="0 0 {width:.0} {height:.0}" font-family="sans-serif" font-size="11">"#
    )
}

fn bar_svg(chart: &BarChart) -> String {
    let max = chart.values.iter().copied().fold(0.0, f64::max).max(1.0);
    let n = px(chart.values.len());
    let mut out;

    if chart.horizontal {
        let row = 22.0;
        let label_w = 160.0;
        let height = (n * row + MARGIN).max(CHART_HEIGHT / 2.0);
        let track = CHART_WIDTH - label_w - MARGIN;
        out = open(CHART_WIDTH, height);
        for (i, (label, value)) in chart.labels.iter().zip(&chart.values).enumerate() {
            let y = px(i) * row + 8.0;
            let w = value / max * track;
            let color = chart.colors.get(i).map_or(RED, String::as_str);
            let _ = write!(
                out,
                r#"<text x="{tx:.1}" y="{ty:.1}" text-anchor="end" fill="{INK}">{label}</text><rect x="{label_w:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="{color}"><title>{label}: {value}</title></rect><text x="{vx:.1}" y="{ty:.1}" fill="{INK}">{value}</text>"#,
                tx = label_w - 6.0,
                ty = y + 12.0,
                h = row - 6.0,
                vx = label_w + w + 4.0,
                label = escape(label),
            );
        }
    } else {
        let plot_h = CHART_HEIGHT - 2.0 * MARGIN;
        let slot = (CHART_WIDTH - 2.0 * MARGIN) / n.max(1.0);
        out = open(CHART_WIDTH, CHART_HEIGHT);
        let _ = write!(
            out,
            r#"<line x1="{MARGIN}" y1="{base:.1}" x2="{x2:.1}" y2="{base:.1}" stroke="{GRID}"/>"#,
            base = MARGIN + plot_h,
            x2 = CHART_WIDTH - MARGIN,
        );
        for (i, (label, value)) in chart.labels.iter().zip(&chart.values).enumerate() {
            let h = value / max * plot_h;
            let x = MARGIN + px(i) * slot + slot * 0.15;
            let color = chart.colors.get(i).map_or(RED, String::as_str);
            let _ = write!(
                out,
                r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="{color}"><title>{label}: {value}</title></rect><text x="{cx:.1}" y="{ly:.1}" text-anchor="middle" fill="{INK}">{label}</text>"#,
                y = MARGIN + plot_h - h,
                w = slot * 0.7,
                cx = x + slot * 0.35,
                ly = MARGIN + plot_h + 14.0,
                label = escape(label),
            );
        }
    }
    out.push_str("</svg>");
    out
}

fn doughnut_svg(chart: &DoughnutChart) -> String {
    let total: f64 = chart.values.iter().sum();
    let (cx, cy) = (CHART_HEIGHT / 2.0, CHART_HEIGHT / 2.0);
    let (outer, inner) = (CHART_HEIGHT / 2.0 - 10.0, CHART_HEIGHT / 4.0);
    let mut out = open(CHART_WIDTH, CHART_HEIGHT);
    let mut angle = -FRAC_PI_2;

    for (i, (label, value)) in chart.labels.iter().zip(&chart.values).enumerate() {
        let color = chart.colors.get(i).map_or(RED, String::as_str);
        let sweep = if total > 0.0 { value / total * TAU } else { 0.0 };
        if sweep >= TAU - 1e-9 {
            let _ = write!(
                out,
                r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{r:.1}" fill="none" stroke="{color}" stroke-width="{sw:.1}"><title>{label}: {value}</title></circle>"#,
                r = (outer + inner) / 2.0,
                sw = outer - inner,
                label = escape(label),
            );
        } else if sweep > 0.0 {
            let end = angle + sweep;
            let large = i32::from(sweep > std::f64::consts::PI);
            let point = |r: f64, a: f64| (cx + r * a.cos(), cy + r * a.sin());
            let (ox1, oy1) = point(outer, angle);
            let (ox2, oy2) = point(outer, end);
            let (ix1, iy1) = point(inner, end);
            let (ix2, iy2) = point(inner, angle);
            let _ = write!(
                out,
                r#"<path d="M{ox1:.2},{oy1:.2} A{outer:.1},{outer:.1} 0 {large} 1 {ox2:.2},{oy2:.2} L{ix1:.2},{iy1:.2} A{inner:.1},{inner:.1} 0 {large} 0 {ix2:.2},{iy2:.2} Z" fill="{color}"><title>{label}: {value}</title></path>"#,
                label = escape(label),
            );
            angle = end;
        }
        let _ = write!(
            out,
            r#"<rect x="{lx:.1}" y="{ly:.1}" width="10" height="10" fill="{color}"/><text x="{tx:.1}" y="{ty:.1}" fill="{INK}">{label} ({value})</text>"#,
            lx = CHART_HEIGHT + 10.0,
            ly = 20.0 + px(i) * 16.0,
            tx = CHART_HEIGHT + 26.0,
            ty = 29.0 + px(i) * 16.0,
            label = escape(label),
        );
    }
    out.push_str("</svg>");
    out
}

fn control_svg(chart: &ControlChart) -> String {
    let max = chart.max_value().max(1.0) * 1.1;
    let plot_h = CHART_HEIGHT - 2.0 * MARGIN;
    let plot_w = CHART_WIDTH - 2.0 * MARGIN;
    let slot = plot_w / px(chart.bars.len()).max(1.0);
    let y_of = |v: f64| MARGIN + plot_h - v / max * plot_h;
    let mut out = open(CHART_WIDTH, CHART_HEIGHT);

    for (i, bar) in chart.bars.iter().enumerate() {
        let _ = write!(
            out,
            r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{color}"><title>{key} ({x_label}): {v:.1}d</title></rect>"#,
            x = MARGIN + px(i) * slot,
            y = y_of(bar.y),
            w = (slot * 0.8).max(1.0),
            h = bar.y / max * plot_h,
            color = bar.color,
            key = escape(&bar.key),
            x_label = escape(&bar.x),
            v = bar.y,
        );
    }
    for line in &chart.lines {
        let y = y_of(line.value);
        let (dash, gap) = line.dash;
        let _ = write!(
            out,
            r#"<line x1="{MARGIN}" y1="{y:.2}" x2="{x2:.1}" y2="{y:.2}" stroke="{color}" stroke-width="1.5" stroke-dasharray="{dash} {gap}"/><text x="{x2:.1}" y="{ty:.2}" text-anchor="end" fill="{color}">{name} {v:.1}</text>"#,
            x2 = MARGIN + plot_w,
            ty = y - 3.0,
            color = line.color,
            name = line.name.to_uppercase(),
            v = line.value,
        );
    }
    out.push_str("</svg>");
    out
}

fn gantt_svg(layout: &GanttLayout) -> String {
    let height = f64::from(layout.height);
    let track = GANTT_WIDTH - GANTT_LABEL_WIDTH - 20.0;
    let row = ((height - GANTT_HEADER - 20.0) / px(layout.bars.len()).max(1.0)).min(34.0);
    let x_of = |d| GANTT_LABEL_WIDTH + layout.fraction(d) * track;
    let mut out = open(GANTT_WIDTH, height);

    for tick in &layout.ticks {
        let x = x_of(*tick);
        let _ = write!(
            out,
            r#"<line x1="{x:.1}" y1="{GANTT_HEADER}" x2="{x:.1}" y2="{height:.0}" stroke="{GRID}"/><text x="{x:.1}" y="{ty:.1}" text-anchor="middle" fill="{INK}">{label}</text>"#,
            ty = GANTT_HEADER - 8.0,
            label = tick.format("%d %b"),
        );
    }
    for (i, bar) in layout.bars.iter().enumerate() {
        let y = GANTT_HEADER + px(i) * row;
        let x1 = x_of(bar.start);
        let w = (x_of(bar.end) - x1).max(2.0);
        let _ = write!(
            out,
            r#"<g class="gantt-bar" data-key="{key}"><text x="{lx:.1}" y="{ty:.1}" text-anchor="end" fill="{INK}">{label}</text><rect x="{x1:.1}" y="{by:.1}" width="{w:.1}" height="{bh:.1}" rx="3" fill="{color}"><title>{key} | {status} | {assignee} | {start} to {end}</title></rect></g>"#,
            key = escape(&bar.key),
            lx = GANTT_LABEL_WIDTH - 8.0,
            ty = y + row * 0.6,
            label = escape(&bar.label),
            by = y + row * 0.15,
            bh = row * 0.7,
            color = bar.color.hex(),
            status = escape(&bar.status),
            assignee = escape(&bar.assignee),
            start = bar.start,
            end = bar.end,
        );
    }
    if let Some(today) = layout.today {
        let x = x_of(today);
        let _ = write!(
            out,
            r#"<line class="today" x1="{x:.1}" y1="{y1:.1}" x2="{x:.1}" y2="{height:.0}" stroke="{RED}" stroke-width="2" stroke-dasharray="6 4"/><text x="{x:.1}" y="{ty:.1}" text-anchor="middle" font-weight="bold" fill="{RED}">{TODAY_LABEL}</text>"#,
            y1 = GANTT_HEADER - 4.0,
            ty = GANTT_HEADER - 20.0,
        );
    }
    out.push_str("</svg>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use trackboard_core::aggregate::{ControlSeries, Distribution, SeriesPoint};
    use trackboard_core::chart::spec::{BLUE, CYCLE_TIME_COLOR, PALETTE};
    use trackboard_core::config::GanttConfig;
    use trackboard_core::model::GanttEntry;

    fn dist() -> Distribution {
        Distribution::from_counts(vec![("API".into(), 3), ("Web <beta>".into(), 1)])
    }

    #[test]
    fn bar_chart_escapes_labels() {
        let spec = ChartSpec::bar(&dist(), &[BLUE], false, 6).expect("bar");
        let svg = render(&spec);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Web &lt;beta&gt;"));
        assert_eq!(svg.matches("<rect").count(), 2);
    }

    #[test]
    fn doughnut_with_one_slice_is_a_ring() {
        let one = Distribution::from_counts(vec![("Done".into(), 4)]);
        let svg = render(&ChartSpec::doughnut(&one, &PALETTE).expect("doughnut"));
        assert!(svg.contains("<circle"));
        let svg = render(&ChartSpec::doughnut(&dist(), &PALETTE).expect("doughnut"));
        assert_eq!(svg.matches("<path").count(), 2);
    }

    #[test]
    fn control_chart_draws_bars_and_three_lines() {
        let series = ControlSeries {
            points: vec![
                SeriesPoint { x: "2026-01-01".into(), y: 2.0, key: "A-1".into() },
                SeriesPoint { x: "2026-01-02".into(), y: 9.0, key: "A-2".into() },
            ],
            mean: 5.5,
            ucl: 8.0,
            lcl: 3.0,
        };
        let svg = render(&ChartSpec::control(&series, CYCLE_TIME_COLOR).expect("control"));
        assert_eq!(svg.matches("<rect").count(), 2);
        assert_eq!(svg.matches("<line").count(), 3);
        assert_eq!(svg.matches(r#"stroke-dasharray="6 3""#).count(), 1);
        assert_eq!(svg.matches(r#"stroke-dasharray="4 4""#).count(), 2);
        assert!(svg.contains("UCL 8.0"));
    }

    #[test]
    fn gantt_marks_today() {
        let entry = GanttEntry {
            key: "E-1".into(),
            summary: "Checkout".into(),
            start: "2026-01-01".into(),
            end: "2026-01-10".into(),
            ..GanttEntry::default()
        };
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).expect("date");
        let layout = GanttLayout::build(&[&entry], today, &GanttConfig::default()).expect("layout");
        let svg = render(&ChartSpec::Gantt(layout));
        assert!(svg.contains(TODAY_LABEL));
        assert!(svg.contains(r#"data-key="E-1""#));
    }

    #[test]
    fn backend_replaces_markup_per_target() {
        let mut backend = SvgBackend::new();
        let spec = ChartSpec::bar(&dist(), &[BLUE], false, 6).expect("bar");
        let handle = backend.build("serviceChart-general", &spec);
        assert!(backend.get("serviceChart-general").is_some());
        backend.release("serviceChart-general", handle);
        assert!(backend.get("serviceChart-general").is_none());
        assert_eq!(backend.released(), 1);
    }
}
