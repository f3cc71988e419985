//! Per-domain cross-filter state.
//!
//! A [`Filter`] holds at most one active value per dimension. Setting a
//! value replaces the previous one; toggling the active value clears it.
//! The filter itself is inert: the owning session re-aggregates after
//! every mutation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Issue;

/// Week selector value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Week {
    #[default]
    All,
    Named(String),
}

impl Week {
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Named(week) => week,
        }
    }
}

impl From<&str> for Week {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Named(trimmed.to_string())
        }
    }
}

impl From<String> for Week {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Week> for String {
    fn from(value: Week) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One filterable dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Week,
    Epic,
    Service,
    Status,
}

impl FilterField {
    pub const ALL: [Self; 4] = [Self::Week, Self::Epic, Self::Service, Self::Status];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Epic => "epic",
            Self::Service => "service",
            Self::Status => "status",
        }
    }
}

/// An active constraint, as shown in the filter badge strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterBadge {
    pub field: FilterField,
    pub value: String,
}

impl fmt::Display for FilterBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.label(), self.value)
    }
}

/// Active constraints for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filter {
    pub week: Week,
    pub epic_key: Option<String>,
    pub service: Option<String>,
    pub status: Option<String>,
}

impl Filter {
    /// Returns true if no constraint is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.week.is_all()
            && self.epic_key.is_none()
            && self.service.is_none()
            && self.status.is_none()
    }

    pub fn set_week(&mut self, week: impl Into<Week>) {
        self.week = week.into();
    }

    pub fn set_epic(&mut self, key: &str) {
        self.epic_key = non_empty(key);
    }

    pub fn set_service(&mut self, service: &str) {
        self.service = non_empty(service);
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = non_empty(status);
    }

    /// Toggle the epic constraint. Returns true when a value is now active.
    pub fn toggle_epic(&mut self, key: &str) -> bool {
        toggle(&mut self.epic_key, key)
    }

    /// Toggle the service constraint. Returns true when a value is now active.
    pub fn toggle_service(&mut self, service: &str) -> bool {
        toggle(&mut self.service, service)
    }

    /// Toggle the status constraint. Returns true when a value is now active.
    pub fn toggle_status(&mut self, status: &str) -> bool {
        toggle(&mut self.status, status)
    }

    /// Toggle any dimension by field. Week toggles between the value and `all`.
    pub fn toggle(&mut self, field: FilterField, value: &str) -> bool {
        match field {
            FilterField::Week => {
                let next = Week::from(value);
                if self.week == next {
                    self.week = Week::All;
                } else {
                    self.week = next;
                }
                !self.week.is_all()
            }
            FilterField::Epic => self.toggle_epic(value),
            FilterField::Service => self.toggle_service(value),
            FilterField::Status => self.toggle_status(value),
        }
    }

    pub fn clear(&mut self, field: FilterField) {
        match field {
            FilterField::Week => self.week = Week::All,
            FilterField::Epic => self.epic_key = None,
            FilterField::Service => self.service = None,
            FilterField::Status => self.status = None,
        }
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    /// The currently active value of `field`, if any.
    #[must_use]
    pub fn value(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::Week => match &self.week {
                Week::All => None,
                Week::Named(week) => Some(week),
            },
            FilterField::Epic => self.epic_key.as_deref(),
            FilterField::Service => self.service.as_deref(),
            FilterField::Status => self.status.as_deref(),
        }
    }

    /// Active constraints in display order.
    #[must_use]
    pub fn badges(&self) -> Vec<FilterBadge> {
        FilterField::ALL
            .iter()
            .filter_map(|&field| {
                self.value(field).map(|value| FilterBadge {
                    field,
                    value: value.to_string(),
                })
            })
            .collect()
    }

    /// Returns true if the issue satisfies every active constraint.
    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        let week_ok = match &self.week {
            Week::All => true,
            Week::Named(week) => issue.week == *week,
        };
        week_ok
            && self.epic_key.as_ref().is_none_or(|key| issue.epic_key == *key)
            && self.service.as_ref().is_none_or(|service| issue.service == *service)
            && self.status.as_ref().is_none_or(|status| issue.status == *status)
    }

    /// Issues matching every active constraint, in store order.
    #[must_use]
    pub fn apply<'a>(&self, issues: &'a [Issue]) -> Vec<&'a Issue> {
        issues.iter().filter(|issue| self.matches(issue)).collect()
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn toggle(slot: &mut Option<String>, value: &str) -> bool {
    if value.is_empty() || slot.as_deref() == Some(value) {
        *slot = None;
        false
    } else {
        *slot = Some(value.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(key: &str, week: &str, epic: &str, service: &str, status: &str) -> Issue {
        Issue {
            week: week.into(),
            epic_key: epic.into(),
            service: service.into(),
            status: status.into(),
            ..Issue::new(key)
        }
    }

    #[test]
    fn empty_filter_matches_all() {
        let filter = Filter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&issue("A-1", "W1", "E-1", "Pay", "Open")));
    }

    #[test]
    fn week_all_and_blank_are_equivalent() {
        assert_eq!(Week::from("all"), Week::All);
        assert_eq!(Week::from("ALL"), Week::All);
        assert_eq!(Week::from(""), Week::All);
        assert_eq!(Week::from("2026-W03"), Week::Named("2026-W03".into()));
    }

    #[test]
    fn constraints_combine_with_and() {
        let mut filter = Filter::default();
        filter.set_week("W1");
        filter.set_service("Pay");
        assert!(filter.matches(&issue("A-1", "W1", "", "Pay", "Open")));
        assert!(!filter.matches(&issue("A-2", "W2", "", "Pay", "Open")));
        assert!(!filter.matches(&issue("A-3", "W1", "", "Ship", "Open")));
    }

    #[test]
    fn toggle_same_value_clears() {
        let mut filter = Filter::default();
        assert!(filter.toggle_service("Pay"));
        assert_eq!(filter.service.as_deref(), Some("Pay"));
        assert!(!filter.toggle_service("Pay"));
        assert!(filter.service.is_none());
    }

    #[test]
    fn toggle_new_value_replaces() {
        let mut filter = Filter::default();
        filter.toggle_status("Open");
        assert!(filter.toggle_status("Done"));
        assert_eq!(filter.status.as_deref(), Some("Done"));
    }

    #[test]
    fn toggle_twice_restores_prior_state() {
        let mut filter = Filter::default();
        filter.set_week("W7");
        filter.set_epic("E-1");
        let before = filter.clone();

        filter.toggle(FilterField::Service, "Pay");
        filter.toggle(FilterField::Service, "Pay");
        assert_eq!(filter, before);

        filter.toggle(FilterField::Epic, "E-1");
        filter.toggle(FilterField::Epic, "E-1");
        assert_eq!(filter, before);
    }

    #[test]
    fn week_toggle_flips_between_value_and_all() {
        let mut filter = Filter::default();
        assert!(filter.toggle(FilterField::Week, "W2"));
        assert_eq!(filter.week, Week::Named("W2".into()));
        assert!(!filter.toggle(FilterField::Week, "W2"));
        assert!(filter.week.is_all());
    }

    #[test]
    fn setting_empty_value_unsets() {
        let mut filter = Filter::default();
        filter.set_epic("E-1");
        filter.set_epic("");
        assert!(filter.epic_key.is_none());
    }

    #[test]
    fn clear_one_field_leaves_others() {
        let mut filter = Filter::default();
        filter.set_epic("E-1");
        filter.set_status("Open");
        filter.clear(FilterField::Epic);
        assert!(filter.epic_key.is_none());
        assert_eq!(filter.status.as_deref(), Some("Open"));
        filter.clear_all();
        assert!(filter.is_empty());
    }

    #[test]
    fn badges_follow_field_order() {
        let mut filter = Filter::default();
        filter.set_status("Open");
        filter.set_week("W4");
        let badges = filter.badges();
        assert_eq!(badges.len(), 2);
        assert_eq!(badges[0].to_string(), "week: W4");
        assert_eq!(badges[1].to_string(), "status: Open");
    }

    #[test]
    fn week_serializes_as_plain_string() {
        let mut filter = Filter::default();
        let json = serde_json::to_value(&filter).expect("serialize");
        assert_eq!(json["week"], "all");
        filter.set_week("W9");
        let json = serde_json::to_value(&filter).expect("serialize");
        assert_eq!(json["week"], "W9");
    }
}
