//! E2E CLI tests covering the report commands, the static site build and
//! the scheduler's argument validation.
//!
//! Each test runs `tb` as a subprocess against a dataset written into an
//! isolated temp directory, with a pinned `--today`.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

const DATASET: &str = r#"{
    "generated_at": "2026-01-10 08:00",
    "domains": [
        {"slug": "general", "name": "General"},
        {"slug": "pagos", "name": "Pagos"}
    ],
    "issues": {
        "general": [
            {"key": "A-1", "service": "API", "status": "Done", "created": "2026-01-01", "week": "2026-W01", "epic_key": "E-1", "cycle_time": 2.0, "lead_time": 5.0},
            {"key": "A-2", "service": "API", "status": "Open", "created": "2026-01-02", "week": "2026-W02", "epic_key": "E-2", "cycle_time": 4.0, "lead_time": 6.0},
            {"key": "A-3", "service": "Web", "status": "Done", "created": "2026-01-03", "week": "2026-W02", "epic_key": "E-1", "cycle_time": 30.0, "lead_time": 40.0},
            {"key": "A-4", "service": "", "status": "Open", "created": "2026-01-05", "week": "2026-W02"}
        ],
        "pagos": [
            {"key": "P-1", "service": "Wallet", "status": "Open", "created": "2026-01-04", "week": "2026-W02"}
        ]
    },
    "epics": [
        {"key": "E-1", "summary": "Checkout revamp", "status": "In Progress", "assignee": "Ana",
         "components": ["1.Pagos", "3.Checkout_API"], "created": "2025-12-20",
         "start_date": "2026-01-01", "planned_done_date": "2026-01-20", "due_date": "2026-01-20"},
        {"key": "E-2", "summary": "Wallet", "status": "Blocked", "assignee": "Luis",
         "components": ["1.Pagos"], "created": "2025-12-22",
         "start_date": "2026-01-05", "due_date": "2026-02-01"},
        {"key": "E-3", "summary": "Old thing", "status": "Listo", "resolution_date": "2025-12-01",
         "created": "2025-10-01"},
        {"key": "E-4", "summary": "Reporting", "status": "In Progress", "assignee": "Ana",
         "components": ["1.Core"], "created": "2026-01-02",
         "start_date": "2026-01-08", "planned_done_date": "2026-01-30"}
    ]
}"#;

/// A project directory with the dataset at the default `[data] path`.
fn project() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).expect("mkdir");
    std::fs::write(data.join("dashboard.json"), DATASET).expect("write dataset");
    dir
}

/// Build a Command targeting the `tb` binary, rooted in `dir`.
fn tb_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tb"));
    cmd.current_dir(dir);
    cmd.env("TRACKBOARD_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir.join(".config"));
    cmd.env("HOME", dir);
    cmd.env_remove("FORMAT");
    cmd.env_remove("TRACKBOARD_TIMING");
    cmd.args(["--today", "2026-01-10"]);
    cmd
}

fn json_of(dir: &Path, args: &[&str]) -> Value {
    let output = tb_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("tb should not crash");
    assert!(
        output.status.success(),
        "tb {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

// ---------------------------------------------------------------------------
// aggregate
// ---------------------------------------------------------------------------

#[test]
fn aggregate_whole_domain() {
    let dir = project();
    let json = json_of(dir.path(), &["aggregate"]);
    assert_eq!(json["domain"], "general");
    assert_eq!(json["issue_count"], 4);
    assert_eq!(json["service"]["API"], 2);
    assert_eq!(json["service"]["Web"], 1);
    assert_eq!(json["service"]["No data"], 1);
    assert_eq!(json["status"]["Open"], 2);
    assert_eq!(json["cycle_time"]["points"].as_array().map(Vec::len), Some(3));
    assert!(json["badges"].as_array().is_some_and(Vec::is_empty));
}

#[test]
fn aggregate_with_cross_filters() {
    let dir = project();
    let json = json_of(
        dir.path(),
        &["aggregate", "--week", "2026-W02", "--service", "API"],
    );
    assert_eq!(json["issue_count"], 1);
    assert_eq!(json["filter"]["week"], "2026-W02");
    assert_eq!(json["badges"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["cycle_time"]["points"][0]["key"], "A-2");
}

#[test]
fn aggregate_text_output_is_tab_separated() {
    let dir = project();
    tb_cmd(dir.path())
        .args(["aggregate", "--domain", "pagos", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("issues\t1"))
        .stdout(predicate::str::contains("service\tWallet\t1"));
}

#[test]
fn unknown_domain_reports_error_code() {
    let dir = project();
    tb_cmd(dir.path())
        .args(["aggregate", "--domain", "ops", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn missing_dataset_reports_error_code() {
    let dir = TempDir::new().expect("tempdir");
    tb_cmd(dir.path())
        .args(["summary", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1001"))
        .stderr(predicate::str::contains("--data"));
}

#[test]
fn data_flag_overrides_config_path() {
    let dir = project();
    let other = TempDir::new().expect("tempdir");
    let data = dir.path().join("data/dashboard.json");
    tb_cmd(other.path())
        .args(["weeks", "--format", "text", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("2026-W02\t3"));
}

// ---------------------------------------------------------------------------
// summary / weeks / gantt
// ---------------------------------------------------------------------------

#[test]
fn summary_counts_relevant_epics() {
    let dir = project();
    let json = json_of(dir.path(), &["summary"]);
    assert_eq!(json["total_issues"], 5);
    assert_eq!(json["epics"]["total_raw"], 4);
    assert_eq!(json["epics"]["total_epics"], 3);
    assert_eq!(json["epics"]["active"], 2);
    assert_eq!(json["epics"]["blocked"], 1);
    assert_eq!(json["epics"]["assignee_dist"]["Ana"], 2);
    assert_eq!(json["domains"].as_array().map(Vec::len), Some(2));
}

#[test]
fn weeks_are_newest_first() {
    let dir = project();
    let out = tb_cmd(dir.path())
        .args(["weeks", "--format", "text"])
        .output()
        .expect("run");
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["2026-W02\t3", "2026-W01\t1"]);
}

#[test]
fn gantt_window_and_today_marker() {
    let dir = project();
    let json = json_of(dir.path(), &["gantt", "--domain", "pagos"]);
    let layout = &json["layout"];
    assert_eq!(layout["window_start"], "2025-12-25");
    assert_eq!(layout["window_end"], "2026-02-15");
    assert_eq!(layout["today"], "2026-01-10");
    assert_eq!(layout["bars"].as_array().map(Vec::len), Some(2));
    assert_eq!(layout["height"], 280);
}

#[test]
fn gantt_status_pill_restricts_bars() {
    let dir = project();
    let json = json_of(dir.path(), &["gantt", "--status", "Blocked"]);
    assert_eq!(json["pill"], "Blocked");
    let bars = json["layout"]["bars"].as_array().expect("bars");
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0]["key"], "E-2");
    assert_eq!(bars[0]["color"], "blocked");
}

// ---------------------------------------------------------------------------
// build / schedule
// ---------------------------------------------------------------------------

#[test]
fn build_writes_index_with_target_ids() {
    let dir = project();
    tb_cmd(dir.path())
        .args(["build", "-o", "site", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("index.html"));

    let html = std::fs::read_to_string(dir.path().join("site/index.html")).expect("index.html");
    for id in [
        "serviceChart-general",
        "statusChart-general",
        "cycleTimeChart-general",
        "leadTimeChart-general",
        "ganttChart-pagos",
        "epicTable-pagos",
    ] {
        assert!(html.contains(&format!("id=\"{id}\"")), "missing {id}");
    }
    assert!(html.contains("TODAY"));
}

#[test]
fn build_reports_counts_as_json() {
    let dir = project();
    let json = json_of(dir.path(), &["build", "-o", "out", "--status", "Open"]);
    assert_eq!(json["domains"], 2);
    assert_eq!(json["issues"], 5);
    assert!(json["bytes"].as_u64().is_some_and(|b| b > 0));
    assert!(dir.path().join("out/index.html").exists());
}

#[test]
fn schedule_rejects_bad_times() {
    let dir = project();
    tb_cmd(dir.path())
        .args(["schedule", "08:00", "25:00", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2003"));
    assert!(!dir.path().join("docs/index.html").exists());
}

#[test]
fn schedule_once_builds_immediately() {
    let dir = project();
    tb_cmd(dir.path())
        .args(["schedule", "08:00", "--once"])
        .assert()
        .success();
    assert!(dir.path().join("docs/index.html").exists());
}

// ---------------------------------------------------------------------------
// ambient
// ---------------------------------------------------------------------------

#[test]
fn timing_report_goes_to_stderr() {
    let dir = project();
    tb_cmd(dir.path())
        .args(["--timing", "weeks", "--format", "text"])
        .assert()
        .success()
        .stderr(predicate::str::contains("timing report"))
        .stderr(predicate::str::contains("cmd.weeks"));
}

#[test]
fn completions_name_the_binary() {
    let dir = project();
    tb_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tb"));
}

#[test]
fn project_config_changes_output_dir() {
    let dir = project();
    let cfg = dir.path().join(".trackboard");
    std::fs::create_dir_all(&cfg).expect("mkdir");
    std::fs::write(cfg.join("config.toml"), "[site]\noutput_dir = \"public\"\n").expect("config");
    tb_cmd(dir.path())
        .args(["build", "--format", "text"])
        .assert()
        .success();
    assert!(dir.path().join("public/index.html").exists());
}

#[test]
fn malformed_config_reports_error_code() {
    let dir = project();
    let cfg = dir.path().join(".trackboard");
    std::fs::create_dir_all(&cfg).expect("mkdir");
    std::fs::write(cfg.join("config.toml"), "[site\n").expect("config");
    tb_cmd(dir.path())
        .args(["summary", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1003"));
}

#[test]
fn out_of_range_config_reports_error_code() {
    let dir = project();
    let cfg = dir.path().join(".trackboard");
    std::fs::create_dir_all(&cfg).expect("mkdir");
    std::fs::write(cfg.join("config.toml"), "[charts]\nsigma = -2.0\n").expect("config");
    tb_cmd(dir.path())
        .args(["aggregate", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1003"))
        .stderr(predicate::str::contains("sigma"));
}
