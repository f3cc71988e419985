use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::error::{Result, TrackboardError};

/// Project-level settings read from `.trackboard/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub epics: EpicConfig,
    #[serde(default)]
    pub charts: ChartConfig,
    #[serde(default)]
    pub gantt: GanttConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl ProjectConfig {
    /// Range checks that TOML typing alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns a description of the first offending key.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let sigma = self.charts.sigma;
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(format!("[charts] sigma must be a finite number >= 0, got {sigma}"));
        }
        for (key, days) in [
            ("pad_before_days", self.gantt.pad_before_days),
            ("pad_after_days", self.gantt.pad_after_days),
        ] {
            if !(0..=MAX_PAD_DAYS).contains(&days) {
                return Err(format!("[gantt] {key} must be within 0..={MAX_PAD_DAYS}, got {days}"));
            }
        }
        Ok(())
    }
}

/// Upper bound for the timeline padding keys, ten years.
pub const MAX_PAD_DAYS: i64 = 3650;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

/// Status vocabulary and cutoff used when enriching raw epics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpicConfig {
    /// Done epics resolved before this date are dropped.
    #[serde(default = "default_cutoff_date")]
    pub cutoff_date: String,
    #[serde(default = "default_done_status")]
    pub done_status: String,
    #[serde(default = "default_active_statuses")]
    pub active_statuses: Vec<String>,
    #[serde(default = "default_blocked_status")]
    pub blocked_status: String,
}

impl Default for EpicConfig {
    fn default() -> Self {
        Self {
            cutoff_date: default_cutoff_date(),
            done_status: default_done_status(),
            active_statuses: default_active_statuses(),
            blocked_status: default_blocked_status(),
        }
    }
}

/// Which issue date orders the control-chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesDate {
    #[default]
    Created,
    Updated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default)]
    pub series_date: SeriesDate,
    /// Bar charts with more categories than this are drawn horizontally.
    #[serde(default = "default_horizontal_threshold")]
    pub horizontal_threshold: usize,
    /// Width of the control band in standard deviations.
    #[serde(default = "default_sigma")]
    pub sigma: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            series_date: SeriesDate::default(),
            horizontal_threshold: default_horizontal_threshold(),
            sigma: default_sigma(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GanttConfig {
    #[serde(default = "default_pad_before_days")]
    pub pad_before_days: i64,
    #[serde(default = "default_pad_after_days")]
    pub pad_after_days: i64,
    #[serde(default = "default_row_height")]
    pub row_height: u32,
    #[serde(default = "default_min_height")]
    pub min_height: u32,
    #[serde(default = "default_label_max_chars")]
    pub label_max_chars: usize,
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
}

impl Default for GanttConfig {
    fn default() -> Self {
        Self {
            pad_before_days: default_pad_before_days(),
            pad_after_days: default_pad_after_days(),
            row_height: default_row_height(),
            min_height: default_min_height(),
            label_max_chars: default_label_max_chars(),
            summary_max_chars: default_summary_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_schedule_times")]
    pub times: Vec<String>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            times: default_schedule_times(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// Load `.trackboard/config.toml` under `project_root`, or defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".trackboard/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }
    let config: ProjectConfig = parse_toml_file(&path)?;
    config
        .validate()
        .map_err(|message| TrackboardError::ConfigInvalid { path, message })?;
    Ok(config)
}

/// Load the per-user config from the platform config directory.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("trackboard/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }
    parse_toml_file(&path)
}

fn parse_toml_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| TrackboardError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str::<T>(&content).map_err(|source| TrackboardError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge project config, user config and environment into one view.
///
/// # Errors
///
/// Returns an error if either config file is malformed.
pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(
        cli_json,
        user.output.as_deref(),
        env_format.as_deref(),
        std::io::stdout().is_terminal(),
    );

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<&str>,
    env_format: Option<&str>,
    is_tty: bool,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if is_tty { "pretty" } else { "text" }.to_string()
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/dashboard.json")
}

fn default_cutoff_date() -> String {
    "2026-01-15".to_string()
}

fn default_done_status() -> String {
    "Listo".to_string()
}

fn default_active_statuses() -> Vec<String> {
    vec!["Work in Progress".to_string(), "In Progress".to_string()]
}

fn default_blocked_status() -> String {
    "Blocked".to_string()
}

const fn default_horizontal_threshold() -> usize {
    6
}

const fn default_sigma() -> f64 {
    2.0
}

const fn default_pad_before_days() -> i64 {
    7
}

const fn default_pad_after_days() -> i64 {
    14
}

const fn default_row_height() -> u32 {
    34
}

const fn default_min_height() -> u32 {
    280
}

const fn default_label_max_chars() -> usize {
    50
}

const fn default_summary_max_chars() -> usize {
    60
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("docs")
}

fn default_schedule_times() -> Vec<String> {
    vec!["08:00".to_string(), "12:00".to_string(), "17:00".to_string()]
}
