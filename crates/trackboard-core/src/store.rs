//! The dataset file and the read-only issue store built from it.
//!
//! A dataset is one JSON document:
//!
//! ```json
//! {
//!   "generated_at": "2026-03-02T08:00:00",
//!   "domains": [{"slug": "pagos", "name": "Pagos"}],
//!   "issues": {"general": [...], "pagos": [...]},
//!   "gantt": {"general": [...]},
//!   "epics": [...]
//! }
//! ```
//!
//! `gantt` is optional; when absent the timeline is derived from `epics`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, warn};

use crate::config::ProjectConfig;
use crate::epics;
use crate::error::{Result, TrackboardError};
use crate::model::{EpicRecord, GanttEntry, Issue};

/// Slug of the domain that sees every record.
pub const GENERAL_SLUG: &str = "general";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    #[serde(default)]
    pub slug: String,
    pub name: String,
}

impl Domain {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            slug: slugify(name),
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn is_general(&self) -> bool {
        self.slug == GENERAL_SLUG
    }
}

/// Raw dataset document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub generated_at: Option<String>,
    pub domains: Vec<Domain>,
    pub issues: BTreeMap<String, Vec<Issue>>,
    pub gantt: Option<BTreeMap<String, Vec<GanttEntry>>>,
    pub epics: Vec<EpicRecord>,
}

impl Dataset {
    /// Read and parse a dataset file.
    ///
    /// # Errors
    ///
    /// Returns [`TrackboardError::DatasetNotFound`] when the file is missing,
    /// [`TrackboardError::Io`] when it cannot be read and
    /// [`TrackboardError::DatasetParse`] when it is not a valid dataset.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TrackboardError::DatasetNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| TrackboardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| TrackboardError::DatasetParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a dataset held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`TrackboardError::DatasetParse`] on malformed JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| TrackboardError::DatasetParse {
            path: "<memory>".into(),
            source,
        })
    }
}

/// Immutable per-domain view over a [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct IssueStore {
    generated_at: Option<String>,
    domains: Vec<Domain>,
    issues: BTreeMap<String, Vec<Issue>>,
    gantt: BTreeMap<String, Vec<GanttEntry>>,
    epics: Vec<EpicRecord>,
}

impl IssueStore {
    /// Index a dataset. `today` decides effective end dates when the
    /// timeline has to be derived from raw epics.
    #[must_use]
    pub fn from_dataset(dataset: Dataset, cfg: &ProjectConfig, today: NaiveDate) -> Self {
        let Dataset {
            generated_at,
            domains: listed,
            issues,
            gantt,
            epics: raw_epics,
        } = dataset;

        let mut domains: Vec<Domain> = Vec::new();
        if listed.is_empty() {
            domains.push(Domain {
                slug: GENERAL_SLUG.to_string(),
                name: "General".to_string(),
            });
        }
        for mut domain in listed {
            if domain.slug.is_empty() {
                domain.slug = slugify(&domain.name);
            }
            if !domains.iter().any(|d| d.slug == domain.slug) {
                domains.push(domain);
            }
        }
        for slug in issues.keys() {
            if !domains.iter().any(|d| &d.slug == slug) {
                debug!(slug = %slug, "domain only present in issues; adding it");
                domains.push(Domain {
                    slug: slug.clone(),
                    name: slug.clone(),
                });
            }
        }

        let gantt = gantt.unwrap_or_else(|| derive_gantt(&domains, &raw_epics, cfg, today));

        for slug in gantt.keys() {
            if !domains.iter().any(|d| &d.slug == slug) {
                warn!(slug = %slug, "timeline entries for an unknown domain are ignored");
            }
        }

        Self {
            generated_at,
            domains,
            issues,
            gantt,
            epics: raw_epics,
        }
    }

    #[must_use]
    pub fn generated_at(&self) -> Option<&str> {
        self.generated_at.as_deref()
    }

    #[must_use]
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// Look up a domain by slug.
    ///
    /// # Errors
    ///
    /// Returns [`TrackboardError::UnknownDomain`] if no domain has that slug.
    pub fn domain(&self, slug: &str) -> Result<&Domain> {
        self.domains
            .iter()
            .find(|d| d.slug == slug)
            .ok_or_else(|| TrackboardError::UnknownDomain {
                slug: slug.to_string(),
            })
    }

    /// Issues of a domain; empty for an unknown slug.
    #[must_use]
    pub fn issues(&self, slug: &str) -> &[Issue] {
        self.issues.get(slug).map_or(&[], Vec::as_slice)
    }

    /// Timeline entries of a domain; empty for an unknown slug.
    #[must_use]
    pub fn gantt(&self, slug: &str) -> &[GanttEntry] {
        self.gantt.get(slug).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn epics(&self) -> &[EpicRecord] {
        &self.epics
    }

    /// Distinct week buckets of a domain, newest first.
    #[must_use]
    pub fn weeks(&self, slug: &str) -> Vec<String> {
        let weeks: BTreeSet<&str> = self
            .issues(slug)
            .iter()
            .map(|i| i.week.as_str())
            .filter(|w| !w.is_empty())
            .collect();
        weeks.into_iter().rev().map(str::to_string).collect()
    }

    #[must_use]
    pub fn total_issues(&self) -> usize {
        self.issues.values().map(Vec::len).sum()
    }
}

fn derive_gantt(
    domains: &[Domain],
    raw: &[EpicRecord],
    cfg: &ProjectConfig,
    today: NaiveDate,
) -> BTreeMap<String, Vec<GanttEntry>> {
    let enriched: Vec<_> = raw
        .iter()
        .filter(|e| epics::is_relevant(e, &cfg.epics))
        .map(|e| epics::enrich(e, today))
        .collect();
    let entries = epics::gantt_entries(&enriched, &cfg.epics, &cfg.gantt);
    debug!(epics = raw.len(), entries = entries.len(), "derived timeline from epics");

    domains
        .iter()
        .map(|domain| {
            let rows = if domain.is_general() {
                entries.clone()
            } else {
                let needle = domain.name.to_lowercase();
                entries
                    .iter()
                    .filter(|e| e.domain.to_lowercase().contains(&needle))
                    .cloned()
                    .collect()
            };
            (domain.slug.clone(), rows)
        })
        .collect()
}

/// Lowercase ASCII slug: runs of non-alphanumerics become one `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
