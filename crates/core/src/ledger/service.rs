use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{error, info};

use super::{ClockIn, ClockOut, Ledger, LedgerStore, StoreError};
use crate::domain::worker::{WorkerId, WorkerRecord};
use crate::errors::ApplicationError;

/// Ledger shared by event handling and publishing.
///
/// The lock is held across mutate, persist and commit, so writes to the
/// store never interleave and a worker's record is never observed half
/// updated. A mutation is committed to memory only after the store accepted
/// the new document.
pub struct AttendanceLedger {
    state: Mutex<Ledger>,
    store: Arc<dyn LedgerStore>,
}

impl AttendanceLedger {
    pub async fn open(store: Arc<dyn LedgerStore>) -> Result<Self, StoreError> {
        let document = store.load().await?;
        let ledger = Ledger::from_document(document);
        info!(
            event_name = "ledger.loaded",
            store = %store.describe(),
            workers = ledger.len(),
            open_sessions = ledger.open_sessions(),
            "attendance ledger loaded"
        );
        Ok(Self { state: Mutex::new(ledger), store })
    }

    pub async fn clock_in(
        &self,
        worker_id: &WorkerId,
        now: DateTime<Utc>,
    ) -> Result<ClockIn, ApplicationError> {
        let mut ledger = self.state.lock().await;
        let mut candidate = ledger.clone();
        let outcome = candidate.clock_in(worker_id, now)?;
        self.persist(&candidate, worker_id).await?;
        *ledger = candidate;
        Ok(outcome)
    }

    pub async fn clock_out(
        &self,
        worker_id: &WorkerId,
        now: DateTime<Utc>,
    ) -> Result<ClockOut, ApplicationError> {
        let mut ledger = self.state.lock().await;
        let mut candidate = ledger.clone();
        let outcome = candidate.clock_out(worker_id, now)?;
        self.persist(&candidate, worker_id).await?;
        *ledger = candidate;
        Ok(outcome)
    }

    pub async fn query_total(&self, worker_id: &WorkerId) -> f64 {
        self.state.lock().await.total(worker_id)
    }

    pub async fn record(&self, worker_id: &WorkerId) -> Option<WorkerRecord> {
        self.state.lock().await.record(worker_id).cloned()
    }

    pub async fn snapshot(&self) -> Vec<(WorkerId, WorkerRecord)> {
        self.state.lock().await.snapshot()
    }

    pub async fn open_sessions(&self) -> usize {
        self.state.lock().await.open_sessions()
    }

    pub fn store(&self) -> Arc<dyn LedgerStore> {
        Arc::clone(&self.store)
    }

    async fn persist(
        &self,
        candidate: &Ledger,
        worker_id: &WorkerId,
    ) -> Result<(), ApplicationError> {
        self.store.save(&candidate.to_document()).await.map_err(|store_error| {
            error!(
                event_name = "ledger.persist_failed",
                worker_id = %worker_id,
                store = %self.store.describe(),
                error = %store_error,
                "ledger write failed; in-memory state left unchanged"
            );
            ApplicationError::Persistence(store_error.to_string())
        })
    }
}
