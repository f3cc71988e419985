use clap::Args;

use trackboard_core::chart::RetainedBackend;
use trackboard_core::session::Dashboard;

use super::{Context, report};
use crate::output::OutputMode;
use crate::tui::{DashboardView, run_dashboard_tui};

/// Arguments for `tb tui`.
#[derive(Args, Debug, Default)]
pub struct TuiArgs {
    /// Domain tab to open first.
    #[arg(long)]
    pub domain: Option<String>,
}

/// Open the interactive dashboard.
///
/// # Errors
///
/// Returns an error when the dataset cannot be loaded, the domain is unknown
/// or the terminal cannot be driven.
pub fn run_tui(args: &TuiArgs, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.load_store(output)?;
    let dash = Dashboard::new(store, ctx.config.clone(), ctx.today, RetainedBackend::new());
    if let Some(slug) = &args.domain {
        dash.session(slug).map_err(|e| report(output, e))?;
    }
    let view = DashboardView::new(dash, args.domain.as_deref())?;
    run_dashboard_tui(view)
}
