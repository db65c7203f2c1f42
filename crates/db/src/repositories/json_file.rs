use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use punchclock_core::ledger::{LedgerDocument, LedgerStore, StoreError};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Ledger document kept as one pretty-printed JSON file.
///
/// Writes land in a sibling `.tmp` file that is renamed over the target, so
/// readers only ever see a complete document.
#[derive(Clone, Debug)]
pub struct JsonFileLedgerStore {
    path: PathBuf,
}

impl JsonFileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl LedgerStore for JsonFileLedgerStore {
    async fn load(&self) -> Result<LedgerDocument, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                info!(
                    event_name = "ledger.store.missing",
                    path = %self.path.display(),
                    "ledger document not found; starting empty"
                );
                return Ok(LedgerDocument::default());
            }
            Err(source) => return Err(StoreError::Read { path: self.path.clone(), source }),
        };

        // An existing but empty file is a torn write, not a fresh ledger.
        serde_json::from_str(&raw)
            .map_err(|source| StoreError::Decode { path: self.path.clone(), source })
    }

    async fn save(&self, document: &LedgerDocument) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(document).map_err(StoreError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Write { path: parent.to_path_buf(), source })?;
        }

        let temp_path = self.temp_path();
        write_synced(&temp_path, &encoded)
            .await
            .map_err(|source| StoreError::Write { path: temp_path.clone(), source })?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|source| StoreError::Write { path: self.path.clone(), source })?;
        sync_parent_dir(&self.path).await;

        debug!(
            event_name = "ledger.store.saved",
            path = %self.path.display(),
            workers = document.0.len(),
            bytes = encoded.len(),
            "ledger document written"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Flushes the directory entry left by the rename. Platforms that cannot
/// open a directory as a file skip this.
async fn sync_parent_dir(path: &Path) {
    let parent = match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    if let Ok(dir) = tokio::fs::File::open(parent).await {
        if let Err(error) = dir.sync_all().await {
            warn!(
                event_name = "ledger.store.dir_sync_failed",
                path = %parent.display(),
                error = %error,
                "ledger directory sync failed"
            );
        }
    }
}
