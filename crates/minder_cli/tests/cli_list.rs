use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};
use time::macros::format_description;
use time::{Duration, OffsetDateTime};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("minder-{nanos}-{file_name}"))
}

fn minder(store_path: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_minder"));
    command
        .env("MINDER_STORE_PATH", store_path)
        .env("MINDER_CONFIG_PATH", store_path.with_extension("config.json"))
        .env("MINDER_DISABLE_NOTIFICATIONS", "1")
        .env("TZ", "UTC");
    command
}

fn utc_dates() -> (String, String, String) {
    let format = format_description!("[year]-[month]-[day]");
    let now = OffsetDateTime::now_utc();
    (
        now.format(&format).expect("format today"),
        (now + Duration::days(1)).format(&format).expect("format tomorrow"),
        (now + Duration::days(30)).format(&format).expect("format later"),
    )
}

fn write_tasks(path: &Path) {
    let (today, tomorrow, later) = utc_dates();
    let content = serde_json::json!({
        "schema_version": 1,
        "tasks": [
            {
                "id": "task-0",
                "title": "Buy milk",
                "date": today,
                "status": "pending",
                "priority": "high",
                "created_at": "2025-12-20T00:00:00Z"
            },
            {
                "id": "task-1",
                "title": "call plumber",
                "date": tomorrow,
                "time": "09:00",
                "status": "completed",
                "priority": "low",
                "created_at": "2025-12-20T00:00:00Z"
            },
            {
                "id": "task-2",
                "title": "renew passport",
                "date": later,
                "status": "pending",
                "priority": "low",
                "created_at": "2025-12-20T00:00:00Z"
            }
        ]
    });
    std::fs::write(path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
}

fn listed_ids(stdout: &[u8]) -> Vec<String> {
    let value: serde_json::Value = serde_json::from_slice(stdout).expect("list prints json");
    value
        .as_array()
        .expect("json array")
        .iter()
        .map(|task| task["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn list_plain_prints_table() {
    let store_path = temp_path("cli-list-plain.json");
    write_tasks(&store_path);

    let output = minder(&store_path)
        .args(["list"])
        .output()
        .expect("failed to run list command");

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Title"));
    assert!(stdout.contains("Buy milk"));
    assert!(stdout.contains("call plumber"));
    assert!(stdout.contains("renew passport"));
}

#[test]
fn list_json_applies_day_and_status_filters() {
    let store_path = temp_path("cli-list-day.json");
    write_tasks(&store_path);

    let week = minder(&store_path)
        .args(["list", "--day", "week", "--json"])
        .output()
        .expect("failed to run list command");
    let pending = minder(&store_path)
        .args(["list", "--status", "pending", "--json"])
        .output()
        .expect("failed to run list command");
    let search = minder(&store_path)
        .args(["list", "--search", "MILK", "--priority", "HIGH", "--json"])
        .output()
        .expect("failed to run list command");

    std::fs::remove_file(&store_path).ok();
    assert!(week.status.success());
    assert_eq!(listed_ids(&week.stdout), vec!["task-0", "task-1"]);
    assert_eq!(listed_ids(&pending.stdout), vec!["task-0", "task-2"]);
    assert_eq!(listed_ids(&search.stdout), vec!["task-0"]);
}

#[test]
fn list_reports_empty_result_with_filters() {
    let store_path = temp_path("cli-list-empty.json");
    write_tasks(&store_path);

    let output = minder(&store_path)
        .args(["list", "--status", "completed", "--priority", "high"])
        .output()
        .expect("failed to run list command");

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No tasks with these filters → Status: completed, Priority: high"));
}

#[test]
fn list_on_missing_store_is_empty() {
    let store_path = temp_path("cli-list-missing.json");

    let output = minder(&store_path)
        .args(["list"])
        .output()
        .expect("failed to run list command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No tasks match your filters"));
}

#[test]
fn list_rejects_unknown_day() {
    let store_path = temp_path("cli-list-bad-day.json");

    let output = minder(&store_path)
        .args(["list", "--day", "someday"])
        .output()
        .expect("failed to run list command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - day must be all, today, tomorrow or week"));
}
