//! Terminal user interface (TUI) for trackboard.
//!
//! ## Entry points
//!
//! - [`run_dashboard_tui`]: tabbed dashboard with cross-filtering charts,
//!   the epic timeline and the epic table.

pub mod dashboard;

use anyhow::{Context as _, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::debug;

pub use dashboard::DashboardView;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Take over the terminal and run `view` until the user quits.
///
/// # Errors
///
/// Returns an error if the terminal cannot be set up or restored, or if a
/// key handler fails.
pub fn run_dashboard_tui(mut view: DashboardView) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let outcome = event_loop(&mut terminal, &mut view);

    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    outcome
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    view: &mut DashboardView,
) -> Result<()> {
    loop {
        terminal.draw(|frame| view.render(frame, frame.area()))?;
        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                // key release events would double every action
                if key.kind == KeyEventKind::Press {
                    view.handle_key(key)?;
                }
            }
        }
        if view.should_quit() {
            debug!("dashboard closed");
            return Ok(());
        }
    }
}
