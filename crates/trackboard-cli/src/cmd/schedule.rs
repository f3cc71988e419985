//! `tb schedule`: rebuild the site at fixed times of day.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::Args;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{error, info, warn};

use trackboard_core::error::{Result, TrackboardError};

use super::build::{BuildArgs, build_site, report_any};
use super::{Context, report};
use crate::output::OutputMode;

#[derive(Args, Debug, Default)]
pub struct ScheduleArgs {
    /// Times of day to rebuild at, as HH:MM (defaults to `[schedule] times`).
    pub times: Vec<String>,

    /// Seconds between clock checks.
    #[arg(long, default_value_t = 30)]
    pub poll_secs: u64,

    /// Validate the times and build once, then exit.
    #[arg(long)]
    pub once: bool,

    #[command(flatten)]
    pub build: BuildArgs,
}

/// Parse `HH:MM` (24-hour clock).
///
/// # Errors
///
/// Returns [`TrackboardError::InvalidScheduleTime`] for anything else.
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    let invalid = || TrackboardError::InvalidScheduleTime {
        value: value.to_string(),
    };
    let trimmed = value.trim();
    let (h, m) = trimmed.split_once(':').ok_or_else(invalid)?;
    if h.len() != 2 || m.len() != 2 {
        return Err(invalid());
    }
    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// Fires each configured time at most once per calendar day.
#[derive(Debug, Clone)]
pub struct Scheduler {
    times: Vec<NaiveTime>,
    fired: BTreeMap<NaiveTime, NaiveDate>,
}

impl Scheduler {
    /// Times already past at `started` count as fired for that day, since
    /// the startup build covers them.
    pub fn new(mut times: Vec<NaiveTime>, started: NaiveDateTime) -> Self {
        times.sort_unstable();
        times.dedup();
        let fired = times
            .iter()
            .filter(|t| **t <= started.time())
            .map(|t| (*t, started.date()))
            .collect();
        Self { times, fired }
    }

    /// Mark every time that is due at `now`; true when at least one was.
    pub fn due(&mut self, now: NaiveDateTime) -> bool {
        let mut any = false;
        for time in &self.times {
            let done_today = self.fired.get(time) == Some(&now.date());
            if *time <= now.time() && !done_today {
                self.fired.insert(*time, now.date());
                any = true;
            }
        }
        any
    }

    /// The next moment a build will run after `now`.
    pub fn next_run(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let today = self
            .times
            .iter()
            .find(|t| **t > now.time() || self.fired.get(*t) != Some(&now.date()))
            .map(|t| now.date().and_time(*t));
        today.or_else(|| {
            let tomorrow = now.date().succ_opt()?;
            self.times.first().map(|t| tomorrow.and_time(*t))
        })
    }
}

pub fn run_schedule(args: &ScheduleArgs, output: OutputMode, ctx: &Context) -> anyhow::Result<()> {
    let raw = if args.times.is_empty() {
        ctx.config.schedule.times.clone()
    } else {
        args.times.clone()
    };
    let times = raw
        .iter()
        .map(|t| parse_time(t))
        .collect::<Result<Vec<_>>>()
        .map_err(|e| report(output, e))?;

    info!(times = ?raw, "building now");
    let first = build_site(&args.build, ctx).map_err(|e| report_any(output, e))?;
    info!(path = %first.path.display(), bytes = first.bytes, "initial build done");
    if args.once {
        return Ok(());
    }

    let mut scheduler = Scheduler::new(times, Local::now().naive_local());
    if let Some(next) = scheduler.next_run(Local::now().naive_local()) {
        info!(next = %next, "waiting for the next scheduled build");
    }
    let poll = Duration::from_secs(args.poll_secs.max(1));
    loop {
        std::thread::sleep(poll);
        let now = Local::now().naive_local();
        if !scheduler.due(now) {
            continue;
        }
        match build_site(&args.build, &ctx.at(now.date())) {
            Ok(built) => info!(
                path = %built.path.display(),
                bytes = built.bytes,
                issues = built.issues,
                "scheduled build done"
            ),
            Err(err) => error!(error = %format!("{err:#}"), "scheduled build failed"),
        }
        match scheduler.next_run(now) {
            Some(next) => info!(next = %next, "waiting for the next scheduled build"),
            None => warn!("no further builds scheduled"),
        }
    }
}
