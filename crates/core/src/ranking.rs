//! Leaderboard derivation and rendering.

use std::cmp::Ordering;

use crate::domain::worker::{WorkerId, WorkerRecord};

#[derive(Clone, Debug, PartialEq)]
pub struct RankingEntry {
    pub rank: usize,
    pub worker_id: WorkerId,
    pub total_minutes: f64,
}

/// Orders workers by accumulated total, highest first. Equal totals fall back
/// to worker id so the order is the same on every load.
pub fn rank(records: &[(WorkerId, WorkerRecord)]) -> Vec<RankingEntry> {
    let mut ordered: Vec<(&WorkerId, f64)> =
        records.iter().map(|(id, record)| (id, record.accumulated_minutes)).collect();
    ordered.sort_by(|(left_id, left), (right_id, right)| {
        right.total_cmp(left).then_with(|| left_id.cmp(right_id))
    });

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, (worker_id, total_minutes))| RankingEntry {
            rank: index + 1,
            worker_id: worker_id.clone(),
            total_minutes,
        })
        .collect()
}

pub fn format_total(value: f64) -> String {
    format!("{value:.2}")
}

pub fn fallback_display_name(worker_id: &WorkerId) -> String {
    format!("Channel {worker_id}")
}

pub fn render_line(entry: &RankingEntry, display_name: &str, unit_label: &str) -> String {
    let total = format_total(entry.total_minutes);
    match unit_label.trim() {
        "" => format!("{}. {display_name} — {total}", entry.rank),
        unit => format!("{}. {display_name} — {total} {unit}", entry.rank),
    }
}

/// Renders one line per entry; `display_name` resolves labels, `None` falls
/// back to the synthetic channel label.
pub fn render_lines<F>(entries: &[RankingEntry], unit_label: &str, mut display_name: F) -> Vec<String>
where
    F: FnMut(&WorkerId) -> Option<String>,
{
    entries
        .iter()
        .map(|entry| {
            let name = display_name(&entry.worker_id)
                .unwrap_or_else(|| fallback_display_name(&entry.worker_id));
            render_line(entry, &name, unit_label)
        })
        .collect()
}

pub fn is_descending(entries: &[RankingEntry]) -> bool {
    entries.windows(2).all(|pair| {
        pair[0].total_minutes.total_cmp(&pair[1].total_minutes) != Ordering::Less
    })
}
