use punchclock_core::ranking::{rank, render_lines};
use serde_json::json;

use crate::commands::{load_ledger, CommandResult};

/// Leaderboard as the bot would post it, labelled by channel id.
pub fn run() -> CommandResult {
    let (config, ledger) = match load_ledger("ranking") {
        Ok(loaded) => loaded,
        Err(failure) => return failure,
    };

    let entries = rank(&ledger.snapshot());
    let lines = render_lines(&entries, &config.attendance.unit_label, |id| Some(id.to_string()));

    let message = if lines.is_empty() {
        "no hours logged yet".to_string()
    } else {
        format!("{} workers ranked", lines.len())
    };

    CommandResult::success_with_data(
        "ranking",
        message,
        Some(json!({
            "unit_label": config.attendance.unit_label,
            "lines": lines,
            "entries": entries
                .iter()
                .map(|entry| json!({
                    "rank": entry.rank,
                    "worker_id": entry.worker_id.as_str(),
                    "total": entry.total_minutes,
                }))
                .collect::<Vec<_>>(),
        })),
    )
}
