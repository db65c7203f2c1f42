use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use punchclock_cli::commands::{doctor, ranking, total};
use serde_json::Value;
use tempfile::TempDir;

const LEDGER_WITH_THREE_WORKERS: &str = r#"{
  "C100": { "clockInTimestamp": null, "accumulatedMinutes": 90.0 },
  "C101": { "clockInTimestamp": "2025-10-17T09:00:00Z", "accumulatedMinutes": 300.5 },
  "C102": { "ingreso": null, "total_minutos": 12.25 }
}"#;

#[test]
fn ranking_orders_workers_by_total() {
    let dir = TempDir::new().expect("temp dir");
    let ledger_path = write_ledger(dir.path(), LEDGER_WITH_THREE_WORKERS);

    with_env(&valid_env(&ledger_path), || {
        let result = ranking::run();
        assert_eq!(result.exit_code, 0, "expected ranking success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ranking");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["message"], "3 workers ranked");

        let lines: Vec<&str> = payload["data"]["lines"]
            .as_array()
            .expect("lines array")
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("1. C101"));
        assert!(lines[0].ends_with("300.50 hours"));
        assert!(lines[1].starts_with("2. C100"));
        assert!(lines[2].starts_with("3. C102"));
        assert!(lines[2].ends_with("12.25 hours"));
    });
}

#[test]
fn ranking_reports_empty_ledger_when_file_is_missing() {
    let dir = TempDir::new().expect("temp dir");
    let ledger_path = dir.path().join("worker_hours.json");

    with_env(&valid_env(&ledger_path), || {
        let result = ranking::run();
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["message"], "no hours logged yet");
        assert_eq!(payload["data"]["lines"].as_array().map(Vec::len), Some(0));
    });
}

#[test]
fn ranking_returns_config_failure_without_tokens() {
    with_env(&[], || {
        let result = ranking::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ranking");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn ranking_returns_ledger_failure_for_corrupt_document() {
    let dir = TempDir::new().expect("temp dir");
    let ledger_path = write_ledger(dir.path(), "{ not json");

    with_env(&valid_env(&ledger_path), || {
        let result = ranking::run();
        assert_eq!(result.exit_code, 4, "expected ledger read failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "ledger_read");
    });
}

#[test]
fn total_for_unknown_worker_is_zero() {
    let dir = TempDir::new().expect("temp dir");
    let ledger_path = write_ledger(dir.path(), LEDGER_WITH_THREE_WORKERS);

    with_env(&valid_env(&ledger_path), || {
        let result = total::run("C999");
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "total");
        assert_eq!(payload["data"]["worker_id"], "C999");
        assert_eq!(payload["data"]["registered"], false);
        assert_eq!(payload["data"]["total"], 0.0);
        assert_eq!(payload["data"]["clocked_in"], false);
        assert_eq!(payload["message"], "C999: 0.00 hours");
    });
}

#[test]
fn total_reports_open_session() {
    let dir = TempDir::new().expect("temp dir");
    let ledger_path = write_ledger(dir.path(), LEDGER_WITH_THREE_WORKERS);

    with_env(&valid_env(&ledger_path), || {
        let result = total::run("C101");
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["registered"], true);
        assert_eq!(payload["data"]["total"], 300.5);
        assert_eq!(payload["data"]["clocked_in"], true);
        assert_eq!(payload["data"]["clock_in_timestamp"], "2025-10-17T09:00:00+00:00");
        assert_eq!(payload["message"], "C101: 300.50 hours (clocked in)");
    });
}

#[test]
fn total_rejects_blank_channel() {
    with_env(&[], || {
        let result = total::run("   ");
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "invalid_argument");
    });
}

#[test]
fn doctor_json_passes_with_valid_env_and_missing_ledger() {
    let dir = TempDir::new().expect("temp dir");
    let ledger_path = dir.path().join("worker_hours.json");

    with_env(&valid_env(&ledger_path), || {
        let payload = parse_payload(&doctor::run(true));
        assert_eq!(payload["overall_status"], "pass");

        let checks = payload["checks"].as_array().expect("checks array");
        let names: Vec<&str> =
            checks.iter().filter_map(|check| check["name"].as_str()).collect();
        assert_eq!(names, ["config_validation", "slack_token_readiness", "ledger_readability"]);
        assert!(checks[2]["details"].as_str().unwrap_or_default().contains("not yet created"));
    });
}

#[test]
fn doctor_json_fails_on_corrupt_ledger() {
    let dir = TempDir::new().expect("temp dir");
    let ledger_path = write_ledger(dir.path(), "[1, 2");

    with_env(&valid_env(&ledger_path), || {
        let payload = parse_payload(&doctor::run(true));
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][2]["name"], "ledger_readability");
        assert_eq!(payload["checks"][2]["status"], "fail");
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[], || {
        let payload = parse_payload(&doctor::run(true));
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
        assert_eq!(payload["checks"][2]["status"], "skipped");
    });
}

fn write_ledger(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("worker_hours.json");
    fs::write(&path, contents).expect("write ledger");
    path
}

fn valid_env(ledger_path: &Path) -> Vec<(&'static str, String)> {
    vec![
        ("PUNCHCLOCK_SLACK_APP_TOKEN", "xapp-test".to_string()),
        ("PUNCHCLOCK_SLACK_BOT_TOKEN", "xoxb-test".to_string()),
        ("PUNCHCLOCK_WORKER_CHANNELS", "C100,C101,C102".to_string()),
        ("PUNCHCLOCK_RANKING_CHANNEL", "C900".to_string()),
        ("PUNCHCLOCK_LEDGER_PATH", ledger_path.display().to_string()),
    ]
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, String)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PUNCHCLOCK_SLACK_APP_TOKEN",
        "PUNCHCLOCK_SLACK_BOT_TOKEN",
        "PUNCHCLOCK_WORKER_CHANNELS",
        "PUNCHCLOCK_LEDGER_PATH",
        "PUNCHCLOCK_UNIT_LABEL",
        "PUNCHCLOCK_PANEL_HISTORY_LIMIT",
        "PUNCHCLOCK_RANKING_CHANNEL",
        "PUNCHCLOCK_RANKING_HISTORY_LIMIT",
        "PUNCHCLOCK_SERVER_BIND_ADDRESS",
        "PUNCHCLOCK_SERVER_HEALTH_CHECK_PORT",
        "PUNCHCLOCK_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "PUNCHCLOCK_LOGGING_LEVEL",
        "PUNCHCLOCK_LOGGING_FORMAT",
        "PUNCHCLOCK_LOG_LEVEL",
        "PUNCHCLOCK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
