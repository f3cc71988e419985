//! Epic enrichment and portfolio-level metrics.
//!
//! Raw epics carry components and labels named `N.value`, where the numeric
//! prefix says which category the value belongs to (`1.Payments` is a
//! domain component, `3.Checkout_API` a service). Enrichment classifies
//! them, picks the date each epic should end on in the timeline, and derives
//! the timeline entries and the summary counts.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::aggregate::Distribution;
use crate::config::{EpicConfig, GanttConfig};
use crate::model::{EpicRecord, GanttColor, GanttEntry};
use crate::stats::round1;

pub const DOMAIN: &str = "Domain";
pub const TEAM: &str = "Team";
pub const SERVICE: &str = "Service";
pub const APP: &str = "App / Product";
pub const KIND: &str = "Type";
pub const UNCLASSIFIED: &str = "Unclassified";

const COMPONENT_CATEGORIES: &[(&str, &str)] = &[
    ("1", DOMAIN),
    ("2", TEAM),
    ("3", SERVICE),
    ("4", APP),
    ("5", KIND),
];

const LABEL_CATEGORIES: &[(&str, &str)] = &[("1", SERVICE), ("2", APP), ("3", KIND)];

/// Category → values, preserving first-seen order inside each category.
pub type Classified = BTreeMap<String, Vec<String>>;

/// Split `"N.value"` into `(category, value)` using `mapping`.
#[must_use]
pub fn classify(name: &str, mapping: &[(&str, &str)]) -> (String, String) {
    if let Some((prefix, rest)) = name.split_once('.') {
        let numeric = !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit());
        if numeric && !rest.is_empty() {
            let category = mapping
                .iter()
                .find(|(p, _)| *p == prefix)
                .map_or_else(|| format!("Group {prefix}"), |(_, c)| (*c).to_string());
            return (category, rest.replace('_', " "));
        }
    }
    (UNCLASSIFIED.to_string(), name.replace('_', " "))
}

fn classify_all(names: &[String], mapping: &[(&str, &str)]) -> Classified {
    let mut out = Classified::new();
    for name in names {
        let (category, value) = classify(name, mapping);
        out.entry(category).or_default().push(value);
    }
    out
}

#[must_use]
pub fn parse_components(components: &[String]) -> Classified {
    classify_all(components, COMPONENT_CATEGORIES)
}

#[must_use]
pub fn parse_labels(labels: &[String]) -> Classified {
    classify_all(labels, LABEL_CATEGORIES)
}

/// An epic with its classified metadata and timeline end date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedEpic {
    #[serde(flatten)]
    pub record: EpicRecord,
    pub components_by_category: Classified,
    pub labels_by_category: Classified,
    /// Empty when no usable end date exists.
    pub gantt_end: String,
    pub domain: String,
    pub team: String,
    pub service: String,
    pub app: String,
    pub kind: String,
}

impl EnrichedEpic {
    /// Values of `category` from components then labels, de-duplicated.
    #[must_use]
    pub fn merged(&self, category: &str) -> Vec<String> {
        let mut seen = Vec::new();
        let from_components = self.components_by_category.get(category).into_iter().flatten();
        let from_labels = self.labels_by_category.get(category).into_iter().flatten();
        for value in from_components.chain(from_labels) {
            if !seen.contains(value) {
                seen.push(value.clone());
            }
        }
        seen
    }
}

/// Done epics resolved before the cutoff are dropped; everything else stays.
#[must_use]
pub fn is_relevant(epic: &EpicRecord, cfg: &EpicConfig) -> bool {
    epic.status != cfg.done_status || epic.resolution_date.as_str() >= cfg.cutoff_date.as_str()
}

/// Planned date while it is still ahead, otherwise the due date, otherwise
/// the (overdue) planned date.
#[must_use]
pub fn effective_end_date(epic: &EpicRecord, today: NaiveDate) -> String {
    let today = today.format("%Y-%m-%d").to_string();
    let planned = epic.planned_done_date.as_str();
    let due = epic.due_date.as_str();

    if !planned.is_empty() && planned >= today.as_str() {
        return planned.to_string();
    }
    if !due.is_empty() {
        return due.to_string();
    }
    planned.to_string()
}

#[must_use]
pub fn enrich(epic: &EpicRecord, today: NaiveDate) -> EnrichedEpic {
    let components_by_category = parse_components(&epic.components);
    let labels_by_category = parse_labels(&epic.labels);
    let mut enriched = EnrichedEpic {
        record: epic.clone(),
        components_by_category,
        labels_by_category,
        gantt_end: effective_end_date(epic, today),
        domain: String::new(),
        team: String::new(),
        service: String::new(),
        app: String::new(),
        kind: String::new(),
    };
    enriched.domain = joined(enriched.components_by_category.get(DOMAIN));
    enriched.team = joined(enriched.components_by_category.get(TEAM));
    enriched.service = enriched.merged(SERVICE).join(", ");
    enriched.app = enriched.merged(APP).join(", ");
    enriched.kind = enriched.merged(KIND).join(", ");
    enriched
}

fn joined(values: Option<&Vec<String>>) -> String {
    values.map(|v| v.join(", ")).unwrap_or_default()
}

/// Timeline colour for an epic.
#[must_use]
pub fn gantt_color(epic: &EpicRecord, cfg: &EpicConfig) -> GanttColor {
    let planned = epic.planned_done_date.as_str();
    let due = epic.due_date.as_str();
    if epic.status == cfg.blocked_status {
        GanttColor::Blocked
    } else if !planned.is_empty() && !due.is_empty() && planned < due {
        GanttColor::Extended
    } else {
        GanttColor::OnTrack
    }
}

/// Timeline entries: open epics with a start and an end, ordered by start.
#[must_use]
pub fn gantt_entries(
    epics: &[EnrichedEpic],
    epic_cfg: &EpicConfig,
    gantt_cfg: &GanttConfig,
) -> Vec<GanttEntry> {
    let mut ordered: Vec<&EnrichedEpic> = epics.iter().collect();
    ordered.sort_by(|a, b| a.record.start_date.cmp(&b.record.start_date));

    ordered
        .into_iter()
        .filter(|e| e.record.status != epic_cfg.done_status)
        .filter(|e| !e.record.start_date.is_empty() && !e.gantt_end.is_empty())
        .map(|e| GanttEntry {
            key: e.record.key.clone(),
            summary: e.record.summary.chars().take(gantt_cfg.summary_max_chars).collect(),
            start: e.record.start_date.clone(),
            end: e.gantt_end.clone(),
            planned_done: e.record.planned_done_date.clone(),
            due: e.record.due_date.clone(),
            status: e.record.status.clone(),
            color: gantt_color(&e.record, epic_cfg),
            assignee: e.record.assignee.clone(),
            domain: e.domain.clone(),
            team: e.team.clone(),
            service: e.service.clone(),
            app: e.app.clone(),
            kind: e.kind.clone(),
        })
        .collect()
}

/// Resolved/unresolved split of the relevant epics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionStats {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub rate_pct: f64,
}

/// Portfolio summary over the relevant epics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpicSummary {
    pub cutoff_date: String,
    pub total_raw: usize,
    pub total_epics: usize,
    pub active: usize,
    pub blocked: usize,
    pub done_recent: usize,
    pub status_dist: Distribution,
    pub domain_dist: Distribution,
    pub team_dist: Distribution,
    pub service_dist: Distribution,
    pub app_dist: Distribution,
    pub kind_dist: Distribution,
    pub assignee_dist: Distribution,
    pub monthly: BTreeMap<String, usize>,
    pub quarterly: BTreeMap<String, usize>,
    pub resolution: ResolutionStats,
}

/// Filter, enrich and summarize raw epics.
#[must_use]
pub fn summarize(raw: &[EpicRecord], cfg: &EpicConfig, today: NaiveDate) -> (Vec<EnrichedEpic>, EpicSummary) {
    let epics: Vec<EnrichedEpic> = raw
        .iter()
        .filter(|e| is_relevant(e, cfg))
        .map(|e| enrich(e, today))
        .collect();

    let count_status = |pred: &dyn Fn(&str) -> bool| {
        epics.iter().filter(|e| pred(&e.record.status)).count()
    };
    let active = count_status(&|s| cfg.active_statuses.iter().any(|a| a == s));
    let blocked = count_status(&|s| s == cfg.blocked_status);
    let done_recent = count_status(&|s| s == cfg.done_status);

    let resolved = epics.iter().filter(|e| !e.record.resolution.is_empty()).count();
    #[allow(clippy::cast_precision_loss)]
    let rate_pct = if epics.is_empty() {
        0.0
    } else {
        round1(resolved as f64 / epics.len() as f64 * 100.0)
    };

    let summary = EpicSummary {
        cutoff_date: cfg.cutoff_date.clone(),
        total_raw: raw.len(),
        total_epics: epics.len(),
        active,
        blocked,
        done_recent,
        status_dist: Distribution::count_by(&epics, |e: &EnrichedEpic| e.record.status.as_str()),
        domain_dist: nested_counts(&epics, |e| {
            e.components_by_category.get(DOMAIN).cloned().unwrap_or_default()
        }),
        team_dist: nested_counts(&epics, |e| {
            e.components_by_category.get(TEAM).cloned().unwrap_or_default()
        }),
        service_dist: nested_counts(&epics, |e| both(e, SERVICE)),
        app_dist: nested_counts(&epics, |e| both(e, APP)),
        kind_dist: nested_counts(&epics, |e| both(e, KIND)),
        assignee_dist: Distribution::count_by(&epics, |e: &EnrichedEpic| e.record.assignee.as_str()),
        monthly: bucket_counts(&epics, |created| created.get(..7).map(str::to_string)),
        quarterly: bucket_counts(&epics, quarter_of),
        resolution: ResolutionStats {
            total: epics.len(),
            resolved,
            unresolved: epics.len() - resolved,
            rate_pct,
        },
    };
    (epics, summary)
}

/// Component values followed by label values, without de-duplication.
fn both(epic: &EnrichedEpic, category: &str) -> Vec<String> {
    let mut values = epic.components_by_category.get(category).cloned().unwrap_or_default();
    values.extend(epic.labels_by_category.get(category).cloned().unwrap_or_default());
    values
}

fn nested_counts(epics: &[EnrichedEpic], values_of: impl Fn(&EnrichedEpic) -> Vec<String>) -> Distribution {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for epic in epics {
        for value in values_of(epic) {
            let slot = counts.entry(value.clone()).or_insert(0);
            if *slot == 0 {
                order.push(value);
            }
            *slot += 1;
        }
    }
    Distribution::from_counts(
        order
            .into_iter()
            .map(|v| {
                let n = counts.get(&v).copied().unwrap_or(0);
                (v, n)
            })
            .collect(),
    )
}

fn bucket_counts(
    epics: &[EnrichedEpic],
    bucket: impl Fn(&str) -> Option<String>,
) -> BTreeMap<String, usize> {
    let mut out = BTreeMap::new();
    for epic in epics {
        if epic.record.created.is_empty() {
            continue;
        }
        if let Some(key) = bucket(&epic.record.created) {
            *out.entry(key).or_insert(0) += 1;
        }
    }
    out
}

/// `YYYY-Qn` for an ISO date, or `None` when the date does not parse.
#[must_use]
pub fn quarter_of(created: &str) -> Option<String> {
    use chrono::Datelike;
    let date = NaiveDate::parse_from_str(created.get(..10)?, "%Y-%m-%d").ok()?;
    Some(format!("{}-Q{}", date.year(), (date.month() - 1) / 3 + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    fn epic(key: &str, status: &str) -> EpicRecord {
        EpicRecord {
            key: key.into(),
            summary: format!("Epic {key}"),
            status: status.into(),
            assignee: "Ana".into(),
            created: "2026-02-10".into(),
            ..EpicRecord::default()
        }
    }

    #[test]
    fn classify_known_unknown_and_bare_names() {
        assert_eq!(
            classify("1.Pagos_Digitales", COMPONENT_CATEGORIES),
            (DOMAIN.to_string(), "Pagos Digitales".to_string())
        );
        assert_eq!(
            classify("9.Misc", COMPONENT_CATEGORIES),
            ("Group 9".to_string(), "Misc".to_string())
        );
        assert_eq!(
            classify("legacy_tag", LABEL_CATEGORIES),
            (UNCLASSIFIED.to_string(), "legacy tag".to_string())
        );
        assert_eq!(classify("x.y", LABEL_CATEGORIES).0, UNCLASSIFIED);
    }

    #[test]
    fn label_prefixes_differ_from_component_prefixes() {
        let labels = parse_labels(&["1.Checkout".to_string(), "3.Ext".to_string()]);
        assert_eq!(labels.get(SERVICE), Some(&vec!["Checkout".to_string()]));
        assert_eq!(labels.get(KIND), Some(&vec!["Ext".to_string()]));
    }

    #[test]
    fn relevance_keeps_open_and_recently_done() {
        let cfg = EpicConfig::default();
        let open = epic("E-1", "In Progress");
        let mut old_done = epic("E-2", "Listo");
        old_done.resolution_date = "2025-12-01".into();
        let mut new_done = epic("E-3", "Listo");
        new_done.resolution_date = "2026-01-15".into();
        assert!(is_relevant(&open, &cfg));
        assert!(!is_relevant(&old_done, &cfg));
        assert!(is_relevant(&new_done, &cfg));
    }

    #[test]
    fn effective_end_prefers_future_planned_then_due() {
        let today = day("2026-03-01");
        let mut e = epic("E-1", "In Progress");
        e.planned_done_date = "2026-04-01".into();
        e.due_date = "2026-05-01".into();
        assert_eq!(effective_end_date(&e, today), "2026-04-01");

        e.planned_done_date = "2026-02-01".into();
        assert_eq!(effective_end_date(&e, today), "2026-05-01");

        e.due_date.clear();
        assert_eq!(effective_end_date(&e, today), "2026-02-01");

        e.planned_done_date.clear();
        assert_eq!(effective_end_date(&e, today), "");
    }

    #[test]
    fn color_classification() {
        let cfg = EpicConfig::default();
        let mut e = epic("E-1", "In Progress");
        assert_eq!(gantt_color(&e, &cfg), GanttColor::OnTrack);
        e.planned_done_date = "2026-03-01".into();
        e.due_date = "2026-04-01".into();
        assert_eq!(gantt_color(&e, &cfg), GanttColor::Extended);
        e.status = "Blocked".into();
        assert_eq!(gantt_color(&e, &cfg), GanttColor::Blocked);
    }

    #[test]
    fn enrich_merges_components_and_labels_without_duplicates() {
        let mut e = epic("E-1", "In Progress");
        e.components = vec!["1.Pagos".into(), "3.API".into()];
        e.labels = vec!["1.API".into(), "1.Web".into()];
        let enriched = enrich(&e, day("2026-01-01"));
        assert_eq!(enriched.domain, "Pagos");
        assert_eq!(enriched.service, "API, Web");
    }

    #[test]
    fn gantt_skips_done_and_undated_and_sorts_by_start() {
        let epic_cfg = EpicConfig::default();
        let gantt_cfg = GanttConfig::default();
        let today = day("2026-01-01");

        let mut late = epic("E-late", "In Progress");
        late.start_date = "2026-02-01".into();
        late.due_date = "2026-03-01".into();
        let mut early = epic("E-early", "Blocked");
        early.start_date = "2026-01-05".into();
        early.due_date = "2026-02-01".into();
        let mut done = epic("E-done", "Listo");
        done.resolution_date = "2026-02-01".into();
        done.start_date = "2026-01-01".into();
        done.due_date = "2026-01-20".into();
        let undated = epic("E-undated", "In Progress");

        let enriched: Vec<EnrichedEpic> =
            [late, early, done, undated].iter().map(|e| enrich(e, today)).collect();
        let entries = gantt_entries(&enriched, &epic_cfg, &gantt_cfg);
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["E-early", "E-late"]);
        assert_eq!(entries[0].color, GanttColor::Blocked);
    }

    #[test]
    fn summary_counts() {
        let cfg = EpicConfig::default();
        let mut a = epic("E-1", "In Progress");
        a.components = vec!["1.Pagos".into()];
        a.resolution = String::new();
        let mut b = epic("E-2", "Blocked");
        b.components = vec!["1.Pagos".into(), "1.Logistica".into()];
        b.created = "2025-11-03".into();
        let mut c = epic("E-3", "Listo");
        c.resolution = "Done".into();
        c.resolution_date = "2026-02-01".into();
        let mut stale = epic("E-4", "Listo");
        stale.resolution_date = "2025-01-01".into();

        let (epics, summary) = summarize(&[a, b, c, stale], &cfg, day("2026-03-01"));
        assert_eq!(epics.len(), 3);
        assert_eq!(summary.total_raw, 4);
        assert_eq!(summary.total_epics, 3);
        assert_eq!(summary.active, 1);
        assert_eq!(summary.blocked, 1);
        assert_eq!(summary.done_recent, 1);
        assert_eq!(summary.domain_dist.get("Pagos"), Some(2));
        assert_eq!(summary.domain_dist.get("Logistica"), Some(1));
        assert_eq!(summary.monthly.get("2026-02"), Some(&2));
        assert_eq!(summary.quarterly.get("2025-Q4"), Some(&1));
        assert_eq!(summary.resolution.resolved, 1);
        assert_eq!(summary.resolution.unresolved, 2);
        assert!((summary.resolution.rate_pct - 33.3).abs() < 1e-9);
    }

    #[test]
    fn quarter_rejects_garbage() {
        assert_eq!(quarter_of("2026-07-04"), Some("2026-Q3".to_string()));
        assert_eq!(quarter_of("soon"), None);
    }
}
