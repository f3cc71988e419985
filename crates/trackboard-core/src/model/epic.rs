use serde::{Deserialize, Serialize};

/// An epic as extracted from the issue tracker, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EpicRecord {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub assignee: String,
    pub created: String,
    pub updated: String,
    pub resolution: String,
    pub resolution_date: String,
    pub labels: Vec<String>,
    pub components: Vec<String>,
    pub start_date: String,
    pub planned_done_date: String,
    pub due_date: String,
    pub url: String,
}
