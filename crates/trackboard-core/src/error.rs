use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes for scripts that consume `tb --json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    DatasetNotFound,
    DatasetParseError,
    ConfigParseError,
    UnknownDomain,
    InvalidDate,
    InvalidScheduleTime,
    IoFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::DatasetNotFound => "E1001",
            Self::DatasetParseError => "E1002",
            Self::ConfigParseError => "E1003",
            Self::UnknownDomain => "E2001",
            Self::InvalidDate => "E2002",
            Self::InvalidScheduleTime => "E2003",
            Self::IoFailed => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::DatasetNotFound => "Dataset file not found",
            Self::DatasetParseError => "Dataset file parse error",
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownDomain => "Unknown domain",
            Self::InvalidDate => "Invalid date",
            Self::InvalidScheduleTime => "Invalid schedule time",
            Self::IoFailed => "I/O failure",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::DatasetNotFound => {
                Some("Pass --data <file> or set [data] path in .trackboard/config.toml.")
            }
            Self::DatasetParseError => Some("Check that the dataset is valid JSON."),
            Self::ConfigParseError => Some("Fix syntax or out-of-range values in .trackboard/config.toml and retry."),
            Self::UnknownDomain => Some("Run `tb summary` to list the known domain slugs."),
            Self::InvalidDate => Some("Dates must be ISO formatted: YYYY-MM-DD."),
            Self::InvalidScheduleTime => Some("Use 24h HH:MM times, e.g. 08:00 17:30."),
            Self::IoFailed => Some("Check disk space and write permissions."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by the trackboard library.
#[derive(Debug, thiserror::Error)]
pub enum TrackboardError {
    #[error("dataset not found: {}", path.display())]
    DatasetNotFound { path: PathBuf },

    #[error("failed to parse dataset {}: {source}", path.display())]
    DatasetParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config {}: {message}", path.display())]
    ConfigInvalid { path: PathBuf, message: String },

    #[error("unknown domain '{slug}'")]
    UnknownDomain { slug: String },

    #[error("invalid date '{value}'")]
    InvalidDate { value: String },

    #[error("'{value}' is not a valid HH:MM time")]
    InvalidScheduleTime { value: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TrackboardError {
    /// The stable machine-readable code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::DatasetNotFound { .. } => ErrorCode::DatasetNotFound,
            Self::DatasetParse { .. } => ErrorCode::DatasetParseError,
            Self::ConfigParse { .. } | Self::ConfigInvalid { .. } => ErrorCode::ConfigParseError,
            Self::UnknownDomain { .. } => ErrorCode::UnknownDomain,
            Self::InvalidDate { .. } => ErrorCode::InvalidDate,
            Self::InvalidScheduleTime { .. } => ErrorCode::InvalidScheduleTime,
            Self::Io { .. } => ErrorCode::IoFailed,
        }
    }

    /// Remediation text, falling back to the code summary when no hint exists.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.error_code();
        code.hint().unwrap_or(code.message()).to_string()
    }
}

pub type Result<T, E = TrackboardError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::DatasetNotFound,
            ErrorCode::DatasetParseError,
            ErrorCode::ConfigParseError,
            ErrorCode::UnknownDomain,
            ErrorCode::InvalidDate,
            ErrorCode::InvalidScheduleTime,
            ErrorCode::IoFailed,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::UnknownDomain.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn unknown_domain_carries_slug_and_hint() {
        let err = TrackboardError::UnknownDomain {
            slug: "payments".into(),
        };
        assert!(err.to_string().contains("payments"));
        assert_eq!(err.error_code(), ErrorCode::UnknownDomain);
        assert!(err.suggestion().contains("tb summary"));
    }
}
