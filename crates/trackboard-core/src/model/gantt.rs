use serde::{Deserialize, Serialize};

/// Schedule health of an epic bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GanttColor {
    /// Planned end matches the due date (or there is no due date).
    #[default]
    OnTrack,
    /// Planned end was moved before the due date, i.e. the due date was pushed out.
    Extended,
    Blocked,
    /// Any value the dataset carries that this build does not know.
    #[serde(other)]
    Unknown,
}

impl GanttColor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnTrack => "on_track",
            Self::Extended => "extended",
            Self::Blocked => "blocked",
            Self::Unknown => "unknown",
        }
    }

    /// Fill colour for the bar.
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::OnTrack => "#2a8703",
            Self::Extended => "#0053e2",
            Self::Blocked => "#ea1100",
            Self::Unknown => "#6B7280",
        }
    }
}

/// One row of the epic timeline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GanttEntry {
    pub key: String,
    pub summary: String,
    pub start: String,
    pub end: String,
    pub planned_done: String,
    pub due: String,
    pub status: String,
    pub color: GanttColor,
    pub assignee: String,
    #[serde(alias = "dominio")]
    pub domain: String,
    #[serde(alias = "equipo")]
    pub team: String,
    #[serde(alias = "servicio")]
    pub service: String,
    pub app: String,
    #[serde(alias = "tipo")]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_round_trips_snake_case() {
        let entry: GanttEntry =
            serde_json::from_str(r#"{"key":"E-1","color":"extended"}"#).expect("parse");
        assert_eq!(entry.color, GanttColor::Extended);
        let text = serde_json::to_string(&entry.color).expect("serialize");
        assert_eq!(text, "\"extended\"");
    }

    #[test]
    fn unknown_color_falls_back_to_grey() {
        let entry: GanttEntry =
            serde_json::from_str(r#"{"key":"E-1","color":"purple"}"#).expect("parse");
        assert_eq!(entry.color, GanttColor::Unknown);
        assert_eq!(entry.color.hex(), "#6B7280");
    }

    #[test]
    fn legacy_column_names_are_accepted() {
        let entry: GanttEntry = serde_json::from_str(
            r#"{"key":"E-1","dominio":"Pagos","equipo":"DF-1","servicio":"API","tipo":"Ext"}"#,
        )
        .expect("parse");
        assert_eq!(entry.domain, "Pagos");
        assert_eq!(entry.team, "DF-1");
        assert_eq!(entry.service, "API");
        assert_eq!(entry.kind, "Ext");
    }
}
