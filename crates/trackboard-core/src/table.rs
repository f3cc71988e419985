//! Searchable, sortable epic table.
//!
//! Visibility rules: a non-empty text search wins; otherwise the chart
//! filter (if any) applies; otherwise every row is shown.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::GanttEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Key,
    Summary,
    Status,
    Assignee,
    Start,
    End,
    Domain,
    Team,
    Service,
    App,
    Kind,
}

impl Column {
    pub const ALL: [Self; 11] = [
        Self::Key,
        Self::Summary,
        Self::Status,
        Self::Assignee,
        Self::Start,
        Self::End,
        Self::Domain,
        Self::Team,
        Self::Service,
        Self::App,
        Self::Kind,
    ];

    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::Key => "Key",
            Self::Summary => "Summary",
            Self::Status => "Status",
            Self::Assignee => "Assignee",
            Self::Start => "Start",
            Self::End => "End",
            Self::Domain => "Domain",
            Self::Team => "Team",
            Self::Service => "Service",
            Self::App => "App",
            Self::Kind => "Type",
        }
    }

    #[must_use]
    pub fn cell(self, row: &GanttEntry) -> &str {
        match self {
            Self::Key => &row.key,
            Self::Summary => &row.summary,
            Self::Status => &row.status,
            Self::Assignee => &row.assignee,
            Self::Start => &row.start,
            Self::End => &row.end,
            Self::Domain => &row.domain,
            Self::Team => &row.team,
            Self::Service => &row.service,
            Self::App => &row.app,
            Self::Kind => &row.kind,
        }
    }

    /// Parse a header or snake-case name, ignoring case.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|c| {
            c.header().eq_ignore_ascii_case(name)
                || serde_json::to_value(c)
                    .ok()
                    .and_then(|v| v.as_str().map(|s| s.eq_ignore_ascii_case(name)))
                    .unwrap_or(false)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartFilter {
    pub column: Column,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct EpicTable {
    rows: Vec<GanttEntry>,
    query: String,
    chart_filter: Option<ChartFilter>,
    sorted_by: Option<Column>,
    /// Last direction used per column, kept when another column is sorted.
    directions: HashMap<Column, SortDirection>,
}

impl EpicTable {
    #[must_use]
    pub fn new(rows: Vec<GanttEntry>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.trim().to_lowercase();
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Apply a chart filter; the same filter again clears it. Returns true
    /// when a filter is active afterwards.
    pub fn toggle_chart_filter(&mut self, column: Column, value: &str) -> bool {
        let same = self
            .chart_filter
            .as_ref()
            .is_some_and(|f| f.column == column && f.value == value);
        if same || value.is_empty() {
            self.chart_filter = None;
        } else {
            self.chart_filter = Some(ChartFilter {
                column,
                value: value.to_string(),
            });
        }
        self.chart_filter.is_some()
    }

    #[must_use]
    pub const fn chart_filter(&self) -> Option<&ChartFilter> {
        self.chart_filter.as_ref()
    }

    /// Drop the search text and the chart filter.
    pub fn clear(&mut self) {
        self.query.clear();
        self.chart_filter = None;
    }

    /// Sort by `column`, flipping the direction that column last used.
    /// The first sort on a column is ascending.
    pub fn sort_by(&mut self, column: Column) -> SortDirection {
        let direction = self
            .directions
            .get(&column)
            .map_or(SortDirection::Ascending, |d| d.flipped());
        self.directions.insert(column, direction);
        self.sorted_by = Some(column);
        direction
    }

    #[must_use]
    pub fn sort(&self) -> Option<(Column, SortDirection)> {
        let column = self.sorted_by?;
        self.directions.get(&column).map(|d| (column, *d))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn is_visible(&self, row: &GanttEntry) -> bool {
        if !self.query.is_empty() {
            return row_text(row).contains(&self.query);
        }
        match &self.chart_filter {
            Some(filter) => filter
                .column
                .cell(row)
                .to_lowercase()
                .contains(&filter.value.to_lowercase()),
            None => true,
        }
    }

    /// Visible rows in display order.
    #[must_use]
    pub fn visible(&self) -> Vec<&GanttEntry> {
        let mut rows: Vec<&GanttEntry> = self.rows.iter().filter(|r| self.is_visible(r)).collect();
        if let Some((column, direction)) = self.sort() {
            rows.sort_by(|a, b| {
                let ord = compare_cells(column.cell(a), column.cell(b));
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        rows
    }

    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.rows.iter().filter(|r| self.is_visible(r)).count()
    }
}

fn row_text(row: &GanttEntry) -> String {
    Column::ALL
        .iter()
        .map(|c| c.cell(row))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn compare_cells(a: &str, b: &str) -> Ordering {
    a.trim().to_lowercase().cmp(&b.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, status: &str, service: &str) -> GanttEntry {
        GanttEntry {
            key: key.into(),
            summary: format!("Work on {key}"),
            status: status.into(),
            service: service.into(),
            ..GanttEntry::default()
        }
    }

    fn table() -> EpicTable {
        EpicTable::new(vec![
            row("E-2", "Blocked", "Checkout API"),
            row("E-1", "In Progress", "Wallet"),
            row("E-3", "In Progress", "checkout web"),
        ])
    }

    fn keys(t: &EpicTable) -> Vec<String> {
        t.visible().iter().map(|r| r.key.clone()).collect()
    }

    #[test]
    fn chart_filter_is_substring_and_toggles() {
        let mut t = table();
        assert!(t.toggle_chart_filter(Column::Service, "Checkout"));
        assert_eq!(keys(&t), vec!["E-2", "E-3"]);
        assert_eq!(t.visible_count(), 2);
        assert!(!t.toggle_chart_filter(Column::Service, "Checkout"));
        assert_eq!(t.visible_count(), 3);
    }

    #[test]
    fn search_overrides_chart_filter_until_cleared() {
        let mut t = table();
        t.toggle_chart_filter(Column::Status, "Blocked");
        t.set_query("wallet");
        assert_eq!(keys(&t), vec!["E-1"]);
        t.set_query("");
        assert_eq!(keys(&t), vec!["E-2"]);
    }

    #[test]
    fn sort_toggles_direction_per_column() {
        let mut t = table();
        assert_eq!(t.sort_by(Column::Key), SortDirection::Ascending);
        assert_eq!(keys(&t), vec!["E-1", "E-2", "E-3"]);
        assert_eq!(t.sort_by(Column::Key), SortDirection::Descending);
        assert_eq!(keys(&t), vec!["E-3", "E-2", "E-1"]);
        assert_eq!(t.sort_by(Column::Status), SortDirection::Ascending);
        assert_eq!(keys(&t)[0], "E-2");
        assert_eq!(t.sort(), Some((Column::Status, SortDirection::Ascending)));
    }

    #[test]
    fn each_column_remembers_its_direction() {
        let mut t = table();
        t.sort_by(Column::Key);
        t.sort_by(Column::Status);
        // Key was last ascending, so coming back to it flips to descending.
        assert_eq!(t.sort_by(Column::Key), SortDirection::Descending);
        assert_eq!(keys(&t), vec!["E-3", "E-2", "E-1"]);
        assert_eq!(t.sort_by(Column::Status), SortDirection::Descending);
        assert_eq!(keys(&t)[0], "E-1");
    }

    #[test]
    fn column_parse_accepts_header_and_snake_names() {
        assert_eq!(Column::parse("Type"), Some(Column::Kind));
        assert_eq!(Column::parse("kind"), Some(Column::Kind));
        assert_eq!(Column::parse("ASSIGNEE"), Some(Column::Assignee));
        assert_eq!(Column::parse("color"), None);
    }
}
