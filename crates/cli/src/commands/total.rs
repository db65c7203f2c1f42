use punchclock_core::domain::worker::WorkerId;
use punchclock_core::ranking::format_total;
use serde_json::json;

use crate::commands::{load_ledger, CommandResult};

pub fn run(channel: &str) -> CommandResult {
    let channel = channel.trim();
    if channel.is_empty() {
        return CommandResult::failure("total", "invalid_argument", "channel id is required", 2);
    }

    let (config, ledger) = match load_ledger("total") {
        Ok(loaded) => loaded,
        Err(failure) => return failure,
    };

    let worker_id = WorkerId::new(channel);
    let record = ledger.record(&worker_id);
    let total = ledger.total(&worker_id);
    let clock_in = record.and_then(|record| record.clock_in_timestamp);

    let mut message = format!("{channel}: {}", format_total(total));
    if !config.attendance.unit_label.trim().is_empty() {
        message = format!("{message} {}", config.attendance.unit_label.trim());
    }
    if clock_in.is_some() {
        message.push_str(" (clocked in)");
    }

    CommandResult::success_with_data(
        "total",
        message,
        Some(json!({
            "worker_id": channel,
            "registered": config.is_worker_channel(channel),
            "total": total,
            "clocked_in": clock_in.is_some(),
            "clock_in_timestamp": clock_in.map(|timestamp| timestamp.to_rfc3339()),
        })),
    )
}
