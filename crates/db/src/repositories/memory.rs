use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use punchclock_core::ledger::{LedgerDocument, LedgerStore, StoreError};

#[derive(Default)]
pub struct InMemoryLedgerStore {
    document: RwLock<LedgerDocument>,
    saves: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryLedgerStore {
    pub fn with_document(document: LedgerDocument) -> Self {
        Self { document: RwLock::new(document), ..Self::default() }
    }

    pub async fn document(&self) -> LedgerDocument {
        self.document.read().await.clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Makes subsequent saves fail until switched back off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn load(&self) -> Result<LedgerDocument, StoreError> {
        Ok(self.document.read().await.clone())
    }

    async fn save(&self, document: &LedgerDocument) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is refusing writes".to_owned()));
        }

        *self.document.write().await = document.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_owned()
    }
}
