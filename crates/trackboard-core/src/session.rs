//! Per-domain sessions and the controller that owns them.
//!
//! Every mutation goes through [`Dashboard`], which updates the domain's
//! [`Filter`], re-aggregates from the store and redraws that domain's
//! charts through its [`ChartRegistry`]. A domain is aggregated lazily on
//! its first activation; from then on it stays built and is redrawn in
//! place.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::aggregate::{AggregateOptions, AggregateResult, aggregate};
use crate::chart::{ChartBackend, ChartRegistry, ChartSpec, Target, metric_charts};
use crate::config::ProjectConfig;
use crate::error::{Result, TrackboardError};
use crate::filter::{Filter, FilterBadge, FilterField, Week};
use crate::gantt::{self, GanttLayout, GanttPill};
use crate::model::GanttEntry;
use crate::store::IssueStore;
use crate::table::EpicTable;
use crate::timing;

/// State of one domain tab.
#[derive(Debug, Clone)]
pub struct DomainSession {
    pub slug: String,
    pub filter: Filter,
    pub built: bool,
    pub aggregate: Option<AggregateResult>,
    pub gantt_pill: GanttPill,
    pub table: EpicTable,
}

impl DomainSession {
    fn new(slug: &str, rows: Vec<GanttEntry>) -> Self {
        Self {
            slug: slug.to_string(),
            filter: Filter::default(),
            built: false,
            aggregate: None,
            gantt_pill: GanttPill::All,
            table: EpicTable::new(rows),
        }
    }
}

pub struct Dashboard<B: ChartBackend> {
    store: IssueStore,
    config: ProjectConfig,
    today: NaiveDate,
    sessions: BTreeMap<String, DomainSession>,
    order: Vec<String>,
    active: String,
    charts: ChartRegistry<B>,
}

impl<B: ChartBackend> Dashboard<B> {
    /// Create a controller with every domain unbuilt and the first one
    /// active. Nothing is drawn until [`switch_tab`](Self::switch_tab).
    #[must_use]
    pub fn new(store: IssueStore, config: ProjectConfig, today: NaiveDate, backend: B) -> Self {
        let order: Vec<String> = store.domains().iter().map(|d| d.slug.clone()).collect();
        let sessions = order
            .iter()
            .map(|slug| {
                (
                    slug.clone(),
                    DomainSession::new(slug, store.gantt(slug).to_vec()),
                )
            })
            .collect();
        let active = order.first().cloned().unwrap_or_default();
        Self {
            store,
            config,
            today,
            sessions,
            order,
            active,
            charts: ChartRegistry::new(backend),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &IssueStore {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    #[must_use]
    pub const fn today(&self) -> NaiveDate {
        self.today
    }

    /// Domain slugs in tab order.
    #[must_use]
    pub fn slugs(&self) -> &[String] {
        &self.order
    }

    #[must_use]
    pub fn active(&self) -> &str {
        &self.active
    }

    #[must_use]
    pub const fn charts(&self) -> &ChartRegistry<B> {
        &self.charts
    }

    /// Session of `slug`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn session(&self, slug: &str) -> Result<&DomainSession> {
        self.sessions.get(slug).ok_or_else(|| unknown(slug))
    }

    fn session_mut(&mut self, slug: &str) -> Result<&mut DomainSession> {
        self.sessions.get_mut(slug).ok_or_else(|| unknown(slug))
    }

    /// Activate a tab. The first activation aggregates and draws; later
    /// ones only redraw the timeline.
    ///
    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn switch_tab(&mut self, slug: &str) -> Result<()> {
        let built = self.session(slug)?.built;
        self.active = slug.to_string();
        if built {
            self.render_gantt(slug)?;
        } else {
            info!(domain = slug, "building tab");
            self.refresh(slug)?;
        }
        Ok(())
    }

    /// Activate the tab after (or before, with `back`) the current one.
    ///
    /// # Errors
    ///
    /// Propagates [`switch_tab`](Self::switch_tab) errors.
    pub fn cycle_tab(&mut self, back: bool) -> Result<()> {
        if self.order.is_empty() {
            return Ok(());
        }
        let n = self.order.len();
        let current = self.order.iter().position(|s| *s == self.active).unwrap_or(0);
        let next = if back { (current + n - 1) % n } else { (current + 1) % n };
        let slug = self.order[next].clone();
        self.switch_tab(&slug)
    }

    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn set_week(&mut self, slug: &str, week: impl Into<Week>) -> Result<()> {
        self.session_mut(slug)?.filter.set_week(week);
        self.refresh(slug)
    }

    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn set_epic(&mut self, slug: &str, key: &str) -> Result<()> {
        self.session_mut(slug)?.filter.set_epic(key);
        self.refresh(slug)
    }

    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn set_service(&mut self, slug: &str, service: &str) -> Result<()> {
        self.session_mut(slug)?.filter.set_service(service);
        self.refresh(slug)
    }

    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn set_status(&mut self, slug: &str, status: &str) -> Result<()> {
        self.session_mut(slug)?.filter.set_status(status);
        self.refresh(slug)
    }

    /// Toggle the epic filter, as a click on a timeline bar does.
    ///
    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn toggle_epic(&mut self, slug: &str, key: &str) -> Result<bool> {
        let active = self.session_mut(slug)?.filter.toggle_epic(key);
        self.refresh(slug)?;
        Ok(active)
    }

    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn toggle_service(&mut self, slug: &str, service: &str) -> Result<bool> {
        let active = self.session_mut(slug)?.filter.toggle_service(service);
        self.refresh(slug)?;
        Ok(active)
    }

    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn toggle_status(&mut self, slug: &str, status: &str) -> Result<bool> {
        let active = self.session_mut(slug)?.filter.toggle_status(status);
        self.refresh(slug)?;
        Ok(active)
    }

    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn clear_filter(&mut self, slug: &str, field: FilterField) -> Result<()> {
        self.session_mut(slug)?.filter.clear(field);
        self.refresh(slug)
    }

    /// Clear every filter of the domain, including the table search and
    /// chart filter.
    ///
    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn clear_all_filters(&mut self, slug: &str) -> Result<()> {
        let session = self.session_mut(slug)?;
        session.filter.clear_all();
        session.table.clear();
        self.refresh(slug)
    }

    /// Restrict the timeline to one status (`"all"` shows everything).
    ///
    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn set_gantt_filter(&mut self, slug: &str, pill: impl Into<GanttPill>) -> Result<()> {
        self.session_mut(slug)?.gantt_pill = pill.into();
        self.render_gantt(slug)
    }

    /// Mutable access to the domain's epic table (search, sort, chart filter).
    ///
    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn table_mut(&mut self, slug: &str) -> Result<&mut EpicTable> {
        Ok(&mut self.session_mut(slug)?.table)
    }

    /// Badges for the domain's active filters.
    ///
    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn badges(&self, slug: &str) -> Result<Vec<FilterBadge>> {
        Ok(self.session(slug)?.filter.badges())
    }

    /// Timeline entries currently drawn for the domain.
    ///
    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn visible_gantt(&self, slug: &str) -> Result<Vec<&GanttEntry>> {
        let session = self.session(slug)?;
        Ok(gantt::visible(
            self.store.gantt(slug),
            &session.gantt_pill,
            session.filter.epic_key.as_deref(),
        ))
    }

    /// # Errors
    ///
    /// Returns `UnknownDomain` when the slug is not a known domain.
    pub fn gantt_layout(&self, slug: &str) -> Result<Option<GanttLayout>> {
        let entries = self.visible_gantt(slug)?;
        Ok(GanttLayout::build(&entries, self.today, &self.config.gantt))
    }

    /// Re-aggregate and redraw everything the domain shows.
    fn refresh(&mut self, slug: &str) -> Result<()> {
        let opts = AggregateOptions::from(&self.config.charts);
        let threshold = self.config.charts.horizontal_threshold;

        let session = self.sessions.get(slug).ok_or_else(|| unknown(slug))?;
        let issues = session.filter.apply(self.store.issues(slug));
        let result = timing::timed("aggregate", || aggregate(&issues, opts));

        for (target, spec) in Target::METRICS.iter().zip(metric_charts(&result, threshold)) {
            self.charts.render(&target.id(slug), spec.as_ref());
        }
        debug!(domain = slug, issues = result.issue_count, "domain redrawn");

        let session = self.session_mut(slug)?;
        session.aggregate = Some(result);
        session.built = true;
        self.render_gantt(slug)
    }

    fn render_gantt(&mut self, slug: &str) -> Result<()> {
        let spec = self.gantt_layout(slug)?.map(ChartSpec::Gantt);
        self.charts.render(&Target::Gantt.id(slug), spec.as_ref());
        Ok(())
    }
}

fn unknown(slug: &str) -> TrackboardError {
    TrackboardError::UnknownDomain {
        slug: slug.to_string(),
    }
}
