//! Aggregation of a filtered issue list into chart-ready data.
//!
//! [`aggregate`] is pure: the same issues and options always produce the
//! same [`AggregateResult`].

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use tracing::debug;

use crate::config::{ChartConfig, SeriesDate};
use crate::model::Issue;
use crate::stats::{ControlLimits, DEFAULT_SIGMA};

/// Label used for issues with an empty grouping key.
pub const UNSET_LABEL: &str = "No data";

/// Label → count, sorted by descending count; ties keep first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Distribution {
    entries: Vec<(String, usize)>,
}

impl Distribution {
    /// Count `items` grouped by `key_fn`.
    pub fn count_by<'a, T: 'a>(
        items: impl IntoIterator<Item = &'a T>,
        key_fn: impl Fn(&T) -> &str,
    ) -> Self {
        let mut entries: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for item in items {
            let key = match key_fn(item) {
                "" => UNSET_LABEL,
                other => other,
            };
            if let Some(&slot) = index.get(key) {
                entries[slot].1 += 1;
            } else {
                index.insert(key.to_string(), entries.len());
                entries.push((key.to_string(), 1));
            }
        }
        // stable: equal counts stay in insertion order
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Self { entries }
    }

    /// Build from pre-counted pairs, applying the same ordering rule.
    #[must_use]
    pub fn from_counts(mut entries: Vec<(String, usize)>) -> Self {
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(_, count)| *count)
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, count)| *count)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, count) in &self.entries {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

/// One bar of a control chart.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SeriesPoint {
    /// The ordering date (creation or update date).
    pub x: String,
    /// Metric value in days.
    pub y: f64,
    pub key: String,
}

/// Ordered metric values with their control limits.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ControlSeries {
    pub points: Vec<SeriesPoint>,
    pub mean: f64,
    pub ucl: f64,
    pub lcl: f64,
}

impl ControlSeries {
    #[must_use]
    pub fn limits(&self) -> ControlLimits {
        ControlLimits {
            mean: self.mean,
            ucl: self.ucl,
            lcl: self.lcl,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn from_points(points: Vec<SeriesPoint>, sigma: f64) -> Self {
        let values: Vec<f64> = points.iter().map(|p| p.y).collect();
        let limits = ControlLimits::compute(&values, sigma);
        Self {
            points,
            mean: limits.mean,
            ucl: limits.ucl,
            lcl: limits.lcl,
        }
    }
}

/// Everything the charts of one domain need.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AggregateResult {
    pub issue_count: usize,
    pub service: Distribution,
    pub status: Distribution,
    pub cycle_time: ControlSeries,
    pub lead_time: ControlSeries,
}

/// Knobs for [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateOptions {
    pub series_date: SeriesDate,
    pub sigma: f64,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            series_date: SeriesDate::Created,
            sigma: DEFAULT_SIGMA,
        }
    }
}

impl From<&ChartConfig> for AggregateOptions {
    fn from(cfg: &ChartConfig) -> Self {
        Self {
            series_date: cfg.series_date,
            sigma: cfg.sigma,
        }
    }
}

/// Aggregate `issues` into distributions and control-chart series.
#[must_use]
pub fn aggregate(issues: &[&Issue], opts: AggregateOptions) -> AggregateResult {
    let service = Distribution::count_by(issues.iter().copied(), |i: &Issue| i.service.as_str());
    let status = Distribution::count_by(issues.iter().copied(), |i: &Issue| i.status.as_str());

    let mut ordered: Vec<&Issue> = issues.to_vec();
    ordered.sort_by(|a, b| series_date(a, opts.series_date).cmp(series_date(b, opts.series_date)));

    let mut ct_points = Vec::new();
    let mut lt_points = Vec::new();
    for issue in ordered {
        if let Some(ct) = issue.cycle_time {
            ct_points.push(SeriesPoint {
                x: series_date(issue, opts.series_date).to_string(),
                y: ct,
                key: issue.key.clone(),
            });
        }
        if let Some(lt) = issue.lead_time {
            lt_points.push(SeriesPoint {
                x: series_date(issue, opts.series_date).to_string(),
                y: lt,
                key: issue.key.clone(),
            });
        }
    }

    let result = AggregateResult {
        issue_count: issues.len(),
        service,
        status,
        cycle_time: ControlSeries::from_points(ct_points, opts.sigma),
        lead_time: ControlSeries::from_points(lt_points, opts.sigma),
    };
    debug!(
        issues = result.issue_count,
        services = result.service.len(),
        statuses = result.status.len(),
        cycle_points = result.cycle_time.points.len(),
        lead_points = result.lead_time.points.len(),
        "aggregated issues"
    );
    result
}

fn series_date(issue: &Issue, which: SeriesDate) -> &str {
    match which {
        SeriesDate::Created => &issue.created,
        SeriesDate::Updated => &issue.updated,
    }
}
