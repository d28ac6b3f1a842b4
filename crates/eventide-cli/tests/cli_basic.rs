//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(dir: &TempDir, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_eventide"))
        .args(args)
        .env("EVENTIDE_DATA_DIR", dir.path())
        .env_remove("EVENTIDE_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn list_json(dir: &TempDir, args: &[&str]) -> Vec<serde_json::Value> {
    let mut full = vec!["event", "list", "--json"];
    full.extend_from_slice(args);
    let (code, stdout, stderr) = run_cli(dir, &full);
    assert_eq!(code, 0, "event list failed: {stderr}");
    serde_json::from_str::<serde_json::Value>(&stdout)
        .expect("list output is JSON")
        .as_array()
        .cloned()
        .expect("list output is an array")
}

fn created_id(stdout: &str) -> String {
    stdout
        .trim()
        .strip_prefix("Event created: ")
        .expect("add prints the new id")
        .to_string()
}

#[test]
fn test_event_add_and_list() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(
        &dir,
        &["event", "add", "Dentist", "--date", "2024-03-05", "--start-time", "14:30"],
    );
    assert_eq!(code, 0);
    let id = created_id(&stdout);

    let events = list_json(&dir, &["--month", "2024-03"]);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["title"], "Dentist");
    assert_eq!(events[0]["id"], id.as_str());

    let (code, stdout, _) = run_cli(&dir, &["event", "list", "--on", "2024-03-05"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("14:30"));
    assert!(stdout.contains("Dentist"));
}

#[test]
fn test_recurring_event_expands() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(
        &dir,
        &[
            "event", "add", "Gym", "--date", "2024-01-01", "--repeat", "weekly", "--count", "3",
        ],
    );
    assert_eq!(code, 0);
    let id = created_id(&stdout);

    let events = list_json(&dir, &["--from", "2024-01-01", "--to", "2024-02-29"]);
    let ids: Vec<_> = events.iter().map(|e| e["id"].as_str().unwrap().to_string()).collect();
    assert_eq!(ids, vec![format!("{id}::1"), format!("{id}::2"), format!("{id}::3")]);
}

#[test]
fn test_delete_single_occurrence() {
    let dir = TempDir::new().unwrap();
    let (_, stdout, _) = run_cli(
        &dir,
        &["event", "add", "Standup", "--date", "2024-01-01", "--repeat", "daily", "--count", "5"],
    );
    let id = created_id(&stdout);

    let (code, _, _) = run_cli(&dir, &["event", "delete", &id, "--instance", "2024-01-03"]);
    assert_eq!(code, 0);

    let events = list_json(&dir, &["--from", "2024-01-01", "--to", "2024-01-10"]);
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| e["startDate"] != "2024-01-03"));

    let (code, _, _) = run_cli(&dir, &["event", "delete", &id]);
    assert_eq!(code, 0);
    assert!(list_json(&dir, &["--from", "2024-01-01", "--to", "2024-01-10"]).is_empty());

    // deleting again is harmless
    let (code, _, _) = run_cli(&dir, &["event", "delete", &id]);
    assert_eq!(code, 0);
}

#[test]
fn test_update_single_occurrence() {
    let dir = TempDir::new().unwrap();
    let (_, stdout, _) = run_cli(
        &dir,
        &["event", "add", "Review", "--date", "2024-05-06", "--repeat", "weekly", "--count", "3"],
    );
    let id = created_id(&stdout);

    let (code, _, stderr) = run_cli(
        &dir,
        &["event", "update", &id, "--instance", "2024-05-13", "--title", "Review (moved room)"],
    );
    assert_eq!(code, 0, "update failed: {stderr}");

    let events = list_json(&dir, &["--month", "2024-05"]);
    let titles: Vec<_> = events.iter().map(|e| e["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Review", "Review (moved room)", "Review"]);
}

#[test]
fn test_update_single_occurrence_to_all_day() {
    let dir = TempDir::new().unwrap();
    let (_, stdout, _) = run_cli(
        &dir,
        &[
            "event", "add", "Standup", "--date", "2024-01-01", "--repeat", "weekly", "--count", "3",
        ],
    );
    let id = created_id(&stdout);

    let (code, _, stderr) =
        run_cli(&dir, &["event", "update", &id, "--instance", "2024-01-08", "--all-day"]);
    assert_eq!(code, 0, "update failed: {stderr}");

    let cleared = list_json(&dir, &["--on", "2024-01-08"]);
    assert!(cleared[0].get("startTime").is_none());
    assert!(cleared[0].get("endTime").is_none());

    let untouched = list_json(&dir, &["--on", "2024-01-15"]);
    assert_eq!(untouched[0]["startTime"], "09:00");
}

#[test]
fn test_move_reports_conflicts() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, &["event", "add", "Lunch", "--date", "2024-02-02", "--start-time", "12:00"]);
    let (_, stdout, _) = run_cli(
        &dir,
        &["event", "add", "Call", "--date", "2024-02-01", "--start-time", "12:00"],
    );
    let id = created_id(&stdout);

    let (code, _, stderr) = run_cli(&dir, &["event", "move", &id, "2024-02-02"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("conflicts with: Lunch"));

    let events = list_json(&dir, &["--on", "2024-02-02"]);
    assert_eq!(events.len(), 2);
}

#[test]
fn test_show_unknown_event_fails() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&dir, &["event", "show", "missing"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("missing"));

    let (code, _, _) = run_cli(&dir, &["event", "update", "missing", "--title", "x"]);
    assert_eq!(code, 1);
}

#[test]
fn test_invalid_color_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (code, _, _) = run_cli(&dir, &["event", "add", "Bad", "--color", "blue"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&dir, &["config", "get", "defaults.color"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "#3b82f6");

    let (code, _, _) = run_cli(&dir, &["config", "set", "defaults.color", "#10b981"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(&dir, &["config", "get", "defaults.color"]);
    assert_eq!(stdout.trim(), "#10b981");

    let (code, _, _) = run_cli(&dir, &["config", "set", "defaults.color", "green"]);
    assert_eq!(code, 1);
    let (code, _, stderr) = run_cli(&dir, &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no.such.key"));

    let (code, stdout, _) = run_cli(&dir, &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("[defaults]"));
    assert!(stdout.contains("#10b981"));
}

#[test]
fn test_configured_cap_limits_open_series() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, &["config", "set", "recurrence.default_occurrence_cap", "4"]);
    run_cli(&dir, &["event", "add", "Water plants", "--date", "2024-01-01", "--repeat", "daily"]);

    let events = list_json(&dir, &["--from", "2024-01-01", "--to", "2024-12-31"]);
    assert_eq!(events.len(), 4);
}
