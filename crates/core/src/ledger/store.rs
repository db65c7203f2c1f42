use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use super::LedgerDocument;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not read ledger document `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not write ledger document `{path}`: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("ledger document `{path}` is malformed: {source}")]
    Decode { path: PathBuf, source: serde_json::Error },
    #[error("could not encode ledger document: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("ledger store unavailable: {0}")]
    Unavailable(String),
}

/// Durable home of the whole ledger document.
///
/// `load` returns an empty document when nothing has been stored yet.
/// `save` replaces the stored document in full.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn load(&self) -> Result<LedgerDocument, StoreError>;
    async fn save(&self, document: &LedgerDocument) -> Result<(), StoreError>;
    fn describe(&self) -> String;
}
