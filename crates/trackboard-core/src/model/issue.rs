use serde::{Deserialize, Deserializer, Serialize};

/// One issue as supplied by the dataset. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(alias = "k")]
    pub key: String,
    #[serde(default, alias = "sv", deserialize_with = "null_as_empty")]
    pub service: String,
    #[serde(default, alias = "s", deserialize_with = "null_as_empty")]
    pub status: String,
    /// ISO creation date (`YYYY-MM-DD`).
    #[serde(default, alias = "c", deserialize_with = "null_as_empty")]
    pub created: String,
    /// ISO last-update date (`YYYY-MM-DD`).
    #[serde(default, alias = "u", deserialize_with = "null_as_empty")]
    pub updated: String,
    /// Week bucket label used by the week selector.
    #[serde(default, alias = "w", deserialize_with = "null_as_empty")]
    pub week: String,
    #[serde(default, alias = "ek", deserialize_with = "null_as_empty")]
    pub epic_key: String,
    /// Cycle time in days.
    #[serde(default, alias = "ct")]
    pub cycle_time: Option<f64>,
    /// Lead time in days.
    #[serde(default, alias = "lt")]
    pub lead_time: Option<f64>,
}

/// Trackers export unset text fields as `null`; read them as empty so they
/// land under the placeholder label instead of failing the whole dataset.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Issue {
    /// Minimal constructor used by tests and fixtures.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            service: String::new(),
            status: String::new(),
            created: String::new(),
            updated: String::new(),
            week: String::new(),
            epic_key: String::new(),
            cycle_time: None,
            lead_time: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviated_keys_deserialize() {
        let json = r#"{"k":"CAMDP-1","sv":"Pagos","s":"Done","c":"2026-01-02",
            "u":"2026-01-09","w":"2026-W02","ek":"CAMDP-100","ct":4.5,"lt":null}"#;
        let issue: Issue = serde_json::from_str(json).expect("parse issue");
        assert_eq!(issue.key, "CAMDP-1");
        assert_eq!(issue.service, "Pagos");
        assert_eq!(issue.status, "Done");
        assert_eq!(issue.week, "2026-W02");
        assert_eq!(issue.epic_key, "CAMDP-100");
        assert_eq!(issue.cycle_time, Some(4.5));
        assert_eq!(issue.lead_time, None);
    }

    #[test]
    fn full_keys_and_missing_fields() {
        let json = r#"{"key":"X-2","status":"Open"}"#;
        let issue: Issue = serde_json::from_str(json).expect("parse issue");
        assert_eq!(issue.key, "X-2");
        assert!(issue.service.is_empty());
        assert!(issue.cycle_time.is_none());
    }

    #[test]
    fn null_text_fields_read_as_empty() {
        let json = r#"{"k":"A-1","sv":null,"s":null,"c":null,"u":null,"w":null,"ek":null,"ct":2.0}"#;
        let issue: Issue = serde_json::from_str(json).expect("parse issue");
        assert!(issue.service.is_empty());
        assert!(issue.status.is_empty());
        assert!(issue.week.is_empty());
        assert!(issue.epic_key.is_empty());
        assert_eq!(issue.cycle_time, Some(2.0));
    }
}
