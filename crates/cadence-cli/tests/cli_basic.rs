//! Basic CLI E2E tests.
//!
//! Each test runs the built binary with HOME pointed at a fresh temp
//! directory so config and database never touch the real user profile.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

fn cli(home: &Path, args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_cadence-cli"));
    command
        .args(["--owner", "tester"])
        .args(args)
        .env("HOME", home)
        .env_remove("CADENCE_ENV")
        .env("CADENCE_LOG", "warn");
    command
}

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = cli(home, args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

fn create_goal(home: &Path, label: &str, interval: &str) -> String {
    let out = run_ok(home, &["goal", "create", label, "--interval", interval, "--json"]);
    let goal: serde_json::Value = serde_json::from_str(&out).unwrap();
    goal["id"].as_str().unwrap().to_string()
}

#[test]
fn test_goal_create_and_list() {
    let home = tempfile::tempdir().unwrap();
    let id = create_goal(home.path(), "Drink water", "30");

    let out = run_ok(home.path(), &["goal", "list", "--json"]);
    let goals: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0]["id"], id.as_str());
    assert_eq!(goals[0]["label"], "Drink water");
    assert_eq!(goals[0]["interval_minutes"], 30);
    assert_eq!(goals[0]["goal_type"], "hydration");
}

#[test]
fn test_goal_create_rejects_bad_input() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["goal", "create", "  "]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (_, _, code) = run_cli(home.path(), &["goal", "create", "Water", "--interval", "0"]);
    assert_eq!(code, 1);
}

#[test]
fn test_goal_complete_twice_is_too_soon() {
    let home = tempfile::tempdir().unwrap();
    let id = create_goal(home.path(), "Journal", "60");

    let out = run_ok(home.path(), &["goal", "complete", &id]);
    assert!(out.contains("streak 1"));

    let (_, stderr, code) = run_cli(home.path(), &["goal", "complete", &id]);
    assert_eq!(code, 1);
    assert!(stderr.contains("can be completed again in"));

    let out = run_ok(home.path(), &["goal", "status", &id, "--json"]);
    let views: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
    assert_eq!(views[0]["state"], "satisfied");
}

#[test]
fn test_goal_delete() {
    let home = tempfile::tempdir().unwrap();
    let id = create_goal(home.path(), "Mood", "120");

    run_ok(home.path(), &["goal", "delete", &id]);
    let out = run_ok(home.path(), &["goal", "list", "--json"]);
    let goals: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
    assert!(goals.is_empty());

    let (_, _, code) = run_cli(home.path(), &["goal", "delete", &id]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_get_set() {
    let home = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(home.path(), &["config", "get", "tracker.tick_interval_secs"]).trim(), "60");

    run_ok(home.path(), &["config", "set", "notifications.sound", "false"]);
    assert_eq!(run_ok(home.path(), &["config", "get", "notifications.sound"]).trim(), "false");

    let (_, _, code) = run_cli(home.path(), &["config", "set", "tracker.tick_interval_secs", "0"]);
    assert_eq!(code, 1);

    run_ok(home.path(), &["config", "reset"]);
    assert_eq!(run_ok(home.path(), &["config", "get", "notifications.sound"]).trim(), "true");
}

#[test]
fn test_watch_prints_report() {
    let home = tempfile::tempdir().unwrap();
    create_goal(home.path(), "Stretch", "30");
    run_ok(home.path(), &["config", "set", "notifications.enabled", "false"]);

    let out = run_ok(home.path(), &["watch", "--tick-secs", "1", "--duration-secs", "1"]);
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["goals"].as_array().unwrap().len(), 1);
    assert_eq!(report["overdue"], 0);
}

#[test]
fn test_watch_accepts_completions_on_stdin() {
    let home = tempfile::tempdir().unwrap();
    let id = create_goal(home.path(), "Stretch", "30");
    run_ok(home.path(), &["config", "set", "notifications.enabled", "false"]);

    let mut child = cli(home.path(), &["watch", "--tick-secs", "1", "--duration-secs", "2"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start watch");
    let mut stdin = child.stdin.take().unwrap();
    writeln!(stdin, "complete {id}").unwrap();
    writeln!(stdin, "complete {id}").unwrap();
    drop(stdin);

    let output = child.wait_with_output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "watch failed: {stderr}");
    assert!(stderr.contains("Completed: Stretch (streak 1)"));
    assert!(stderr.contains("can be completed again in"));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["totals"]["completed"], 1);
    assert_eq!(report["completion_rate"], 1.0);
    assert_eq!(report["goals"][0]["state"], "satisfied");

    let out = run_ok(home.path(), &["goal", "status", &id, "--json"]);
    let views: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
    assert_eq!(views[0]["goal"]["streak"], 1);
}

#[test]
fn test_completions() {
    let home = tempfile::tempdir().unwrap();
    let out = run_ok(home.path(), &["completions", "bash"]);
    assert!(out.contains("cadence-cli"));
}
