use punchclock_core::config::{AppConfig, LoadOptions};
use punchclock_core::ledger::{Ledger, LedgerStore};
use punchclock_db::JsonFileLedgerStore;
use secrecy::ExposeSecret;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: format!(
                    "configuration loaded; {} worker channels registered, ranking in {}",
                    config.attendance.worker_channels.len(),
                    config.ranking.channel_id
                ),
            });
            checks.push(check_slack_tokens(&config));
            checks.push(check_ledger_readability(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["slack_token_readiness", "ledger_readability"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_slack_tokens(config: &AppConfig) -> DoctorCheck {
    let app_token = config.slack.app_token.expose_secret();
    let bot_token = config.slack.bot_token.expose_secret();

    if app_token == bot_token {
        return DoctorCheck {
            name: "slack_token_readiness",
            status: CheckStatus::Fail,
            details: "app token and bot token must be different credentials".to_string(),
        };
    }

    DoctorCheck {
        name: "slack_token_readiness",
        status: CheckStatus::Pass,
        details: "app token (xapp-) and bot token (xoxb-) are present and distinct".to_string(),
    }
}

fn check_ledger_readability(config: &AppConfig) -> DoctorCheck {
    let path = &config.attendance.ledger_path;
    if !path.exists() {
        return DoctorCheck {
            name: "ledger_readability",
            status: CheckStatus::Pass,
            details: format!(
                "`{}` not yet created; it is written on the first clock-in",
                path.display()
            ),
        };
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "ledger_readability",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let store = JsonFileLedgerStore::new(path);
    match runtime.block_on(store.load()) {
        Ok(document) => {
            let ledger = Ledger::from_document(document);
            DoctorCheck {
                name: "ledger_readability",
                status: CheckStatus::Pass,
                details: format!(
                    "`{}` readable: {} workers, {} open sessions",
                    path.display(),
                    ledger.len(),
                    ledger.open_sessions()
                ),
            }
        }
        Err(error) => DoctorCheck {
            name: "ledger_readability",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
