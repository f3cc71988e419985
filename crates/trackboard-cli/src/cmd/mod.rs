pub mod aggregate;
pub mod build;
pub mod completions;
pub mod gantt;
pub mod schedule;
pub mod summary;
pub mod tui;
pub mod weeks;

use anyhow::Context as _;
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::debug;

use trackboard_core::config::ProjectConfig;
use trackboard_core::error::TrackboardError;
use trackboard_core::store::{Dataset, IssueStore};

use crate::output::{CliError, OutputMode, render_error};

/// Everything a command needs: config, loaded store and the reference date.
#[derive(Debug, Clone)]
pub struct Context {
    pub project_root: PathBuf,
    pub config: ProjectConfig,
    pub data_path: PathBuf,
    pub today: NaiveDate,
    /// True when `--today` fixed the date; long-running commands keep it.
    pub today_pinned: bool,
}

impl Context {
    pub fn new(
        project_root: &Path,
        config: ProjectConfig,
        data_override: Option<&Path>,
        today: Option<NaiveDate>,
    ) -> Self {
        let data_path = data_override.map_or_else(
            || project_root.join(&config.data.path),
            Path::to_path_buf,
        );
        Self {
            project_root: project_root.to_path_buf(),
            config,
            data_path,
            today: today.unwrap_or_else(|| Local::now().date_naive()),
            today_pinned: today.is_some(),
        }
    }

    /// The same context with the date moved to `today` unless it is pinned.
    #[must_use]
    pub fn at(&self, today: NaiveDate) -> Self {
        let mut next = self.clone();
        if !self.today_pinned {
            next.today = today;
        }
        next
    }

    /// Load the dataset, reporting typed failures through the output layer.
    pub fn load_store(&self, output: OutputMode) -> anyhow::Result<IssueStore> {
        debug!(path = %self.data_path.display(), "loading dataset");
        let dataset = Dataset::load(&self.data_path).map_err(|err| report(output, err))?;
        Ok(IssueStore::from_dataset(dataset, &self.config, self.today))
    }

    /// Resolve a path from the command line or config against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

/// Render a library error for the user and hand it back as `anyhow`.
pub fn report(output: OutputMode, err: TrackboardError) -> anyhow::Error {
    if let Err(render_err) = render_error(output, &CliError::from(&err)) {
        debug!(error = %render_err, "failed to render error");
    }
    anyhow::Error::new(err)
}

/// Cross-filter flags shared by `aggregate` and `build`.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Week bucket to restrict to (`all` for every week).
    #[arg(long)]
    pub week: Option<String>,

    /// Epic key to restrict to.
    #[arg(long)]
    pub epic: Option<String>,

    /// Service to restrict to.
    #[arg(long)]
    pub service: Option<String>,

    /// Issue status to restrict to.
    #[arg(long)]
    pub status: Option<String>,
}

impl FilterArgs {
    pub const fn is_empty(&self) -> bool {
        self.week.is_none() && self.epic.is_none() && self.service.is_none() && self.status.is_none()
    }

    /// Apply the flags to a dashboard domain through its setters.
    pub fn apply<B: trackboard_core::chart::ChartBackend>(
        &self,
        dash: &mut trackboard_core::session::Dashboard<B>,
        slug: &str,
    ) -> trackboard_core::error::Result<()> {
        if let Some(week) = &self.week {
            dash.set_week(slug, week.as_str())?;
        }
        if let Some(epic) = &self.epic {
            dash.set_epic(slug, epic)?;
        }
        if let Some(service) = &self.service {
            dash.set_service(slug, service)?;
        }
        if let Some(status) = &self.status {
            dash.set_status(slug, status)?;
        }
        Ok(())
    }
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}
