//! Attendance ledger: per-worker session state and running totals.
//!
//! [`Ledger`] is the pure state machine. [`AttendanceLedger`] wraps it with
//! a [`LedgerStore`] so every accepted mutation is on disk before it is
//! visible in memory.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::worker::{WorkerId, WorkerRecord};
use crate::errors::ClockError;

pub mod service;
pub mod store;

pub use service::AttendanceLedger;
pub use store::{LedgerStore, StoreError};

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Persisted shape of the ledger: worker id to record, written whole.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerDocument(pub BTreeMap<WorkerId, WorkerRecord>);

#[derive(Clone, Debug, PartialEq)]
pub struct ClockIn {
    pub worker_id: WorkerId,
    pub clocked_in_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClockOut {
    pub worker_id: WorkerId,
    pub clocked_in_at: DateTime<Utc>,
    pub clocked_out_at: DateTime<Utc>,
    pub added_minutes: f64,
    pub total_minutes: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ledger {
    records: BTreeMap<WorkerId, WorkerRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: LedgerDocument) -> Self {
        Self { records: document.0 }
    }

    pub fn to_document(&self) -> LedgerDocument {
        LedgerDocument(self.records.clone())
    }

    pub fn clock_in(
        &mut self,
        worker_id: &WorkerId,
        now: DateTime<Utc>,
    ) -> Result<ClockIn, ClockError> {
        if self.records.get(worker_id).is_some_and(WorkerRecord::is_clocked_in) {
            return Err(ClockError::AlreadyClockedIn { worker_id: worker_id.clone() });
        }

        let record = self.records.entry(worker_id.clone()).or_default();
        record.clock_in_timestamp = Some(now);
        Ok(ClockIn { worker_id: worker_id.clone(), clocked_in_at: now })
    }

    pub fn clock_out(
        &mut self,
        worker_id: &WorkerId,
        now: DateTime<Utc>,
    ) -> Result<ClockOut, ClockError> {
        let Some(record) = self.records.get_mut(worker_id) else {
            return Err(ClockError::NotClockedIn { worker_id: worker_id.clone() });
        };
        let Some(clocked_in_at) = record.clock_in_timestamp else {
            return Err(ClockError::NotClockedIn { worker_id: worker_id.clone() });
        };

        let added_minutes = elapsed_minutes(clocked_in_at, now);
        record.accumulated_minutes += added_minutes;
        record.clock_in_timestamp = None;

        Ok(ClockOut {
            worker_id: worker_id.clone(),
            clocked_in_at,
            clocked_out_at: now,
            added_minutes,
            total_minutes: record.accumulated_minutes,
        })
    }

    pub fn total(&self, worker_id: &WorkerId) -> f64 {
        self.records.get(worker_id).map(|record| record.accumulated_minutes).unwrap_or(0.0)
    }

    pub fn record(&self, worker_id: &WorkerId) -> Option<&WorkerRecord> {
        self.records.get(worker_id)
    }

    /// All records ordered by worker id.
    pub fn snapshot(&self) -> Vec<(WorkerId, WorkerRecord)> {
        self.records.iter().map(|(id, record)| (id.clone(), record.clone())).collect()
    }

    pub fn open_sessions(&self) -> usize {
        self.records.values().filter(|record| record.is_clocked_in()).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Wall-clock minutes between two instants; negative spans count as zero.
pub fn elapsed_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = (to - from).num_milliseconds().max(0);
    millis as f64 / MILLIS_PER_MINUTE
}
