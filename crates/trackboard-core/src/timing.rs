//! Opt-in latency sampling for commands and hot paths.
//!
//! Enabled by `--timing` or `TRACKBOARD_TIMING`. Samples are grouped by
//! operation name as they arrive; [`take_report`] drains them into
//! nearest-rank percentiles.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static ENABLED: AtomicBool = AtomicBool::new(false);
static SAMPLES: Mutex<BTreeMap<String, Vec<Duration>>> = Mutex::new(BTreeMap::new());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpStats {
    pub name: String,
    pub count: usize,
    #[serde(rename = "p50_us", serialize_with = "as_micros")]
    pub p50: Duration,
    #[serde(rename = "p95_us", serialize_with = "as_micros")]
    pub p95: Duration,
    #[serde(rename = "p99_us", serialize_with = "as_micros")]
    pub p99: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimingReport {
    pub operations: Vec<OpStats>,
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Fixed-width table for stderr.
    #[must_use]
    pub fn table(&self) -> String {
        if self.is_empty() {
            return "no timing samples recorded".to_string();
        }
        let mut out = format!(
            "{:<24} {:>6} {:>10} {:>10} {:>10}\n",
            "operation", "count", "p50", "p95", "p99"
        );
        out.push_str(&"-".repeat(64));
        out.push('\n');
        for op in &self.operations {
            let _ = writeln!(
                out,
                "{:<24} {:>6} {:>10} {:>10} {:>10}",
                op.name,
                op.count,
                human(op.p50),
                human(op.p95),
                human(op.p99)
            );
        }
        out
    }
}

/// True when `TRACKBOARD_TIMING` holds `1`, `true`, `yes` or `on`.
#[must_use]
pub fn enabled_from_env() -> bool {
    std::env::var("TRACKBOARD_TIMING").is_ok_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        reset();
    }
}

#[must_use]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Drop every recorded sample.
pub fn reset() {
    if let Ok(mut samples) = SAMPLES.lock() {
        samples.clear();
    }
}

/// Run `f`, recording its wall time under `name` when sampling is on.
pub fn timed<R>(name: &str, f: impl FnOnce() -> R) -> R {
    if !is_enabled() {
        return f();
    }
    let started = Instant::now();
    let out = f();
    record(name, started.elapsed());
    out
}

fn record(name: &str, elapsed: Duration) {
    if let Ok(mut samples) = SAMPLES.lock() {
        samples.entry(name.to_string()).or_default().push(elapsed);
    }
}

/// Drain all samples into a report, operations sorted by name.
#[must_use]
pub fn take_report() -> TimingReport {
    let drained = SAMPLES
        .lock()
        .map(|mut s| std::mem::take(&mut *s))
        .unwrap_or_default();

    let operations = drained
        .into_iter()
        .map(|(name, mut durations)| {
            durations.sort_unstable();
            OpStats {
                name,
                count: durations.len(),
                p50: nearest_rank(&durations, 50),
                p95: nearest_rank(&durations, 95),
                p99: nearest_rank(&durations, 99),
            }
        })
        .collect();
    TimingReport { operations }
}

fn nearest_rank(sorted: &[Duration], pct: usize) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let rank = (pct.min(100) * sorted.len()).div_ceil(100).max(1);
    sorted[rank - 1]
}

fn human(d: Duration) -> String {
    let us = d.as_micros();
    match us {
        0..1_000 => format!("{us}us"),
        1_000..1_000_000 => format!("{:.2}ms", d.as_secs_f64() * 1e3),
        _ => format!("{:.3}s", d.as_secs_f64()),
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn as_micros<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    static GUARD: Mutex<()> = Mutex::new(());

    #[test]
    fn disabled_sampling_records_nothing() {
        let _g = GUARD.lock().expect("guard");
        set_enabled(false);
        assert_eq!(timed("noop", || 3), 3);
        assert!(take_report().is_empty());
    }

    #[test]
    fn enabled_sampling_groups_by_name() {
        let _g = GUARD.lock().expect("guard");
        set_enabled(true);
        timed("test.beta", || ());
        timed("test.alpha", || ());
        timed("test.alpha", || ());
        let report = take_report();
        set_enabled(false);

        let ours: Vec<&OpStats> = report
            .operations
            .iter()
            .filter(|o| o.name.starts_with("test."))
            .collect();
        assert_eq!(ours.len(), 2);
        assert_eq!(ours[0].name, "test.alpha");
        assert_eq!(ours[0].count, 2);
    }

    #[test]
    fn nearest_rank_percentiles() {
        let ms = |n| Duration::from_millis(n);
        let sorted = [ms(1), ms(2), ms(3), ms(4)];
        assert_eq!(nearest_rank(&sorted, 50), ms(2));
        assert_eq!(nearest_rank(&sorted, 95), ms(4));
        assert_eq!(nearest_rank(&[], 50), Duration::ZERO);
    }

    #[test]
    fn report_serializes_micros() {
        let report = TimingReport {
            operations: vec![OpStats {
                name: "cmd.build".into(),
                count: 1,
                p50: Duration::from_micros(1500),
                p95: Duration::from_micros(1500),
                p99: Duration::from_micros(1500),
            }],
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["operations"][0]["p50_us"], 1500);
        assert!(report.table().contains("cmd.build"));
        assert!(report.table().contains("1.50ms"));
    }
}
