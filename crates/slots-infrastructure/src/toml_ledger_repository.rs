//! TOML-backed ledger repository.
//!
//! The whole ledger (accounts, live sessions and the session id counter)
//! lives in one `ledger.toml`. Every commit is a locked load-apply-save
//! cycle, so a batch either lands on disk completely or not at all.

use async_trait::async_trait;
use slots_core::{
    error::{LedgerError, Result},
    ledger::{Account, LedgerChange, LedgerRepository, LedgerState, Session},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;

use crate::paths::SlotsPaths;
use crate::storage::AtomicTomlFile;

/// TOML file implementation of `LedgerRepository`.
///
/// # Features
///
/// - **Atomic writes**: tmp file + fsync + atomic rename
/// - **Cross-process safety**: exclusive lock file around each update
/// - **Async-safe**: All file work runs in `tokio::task::spawn_blocking`
pub struct TomlLedgerRepository {
    file: Arc<AtomicTomlFile<LedgerState>>,
}

impl TomlLedgerRepository {
    /// Creates a repository storing `ledger.toml` inside `data_dir`.
    ///
    /// The directory and file are created lazily on the first write.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let path = SlotsPaths::ledger_file(data_dir.as_ref());
        Self {
            file: Arc::new(AtomicTomlFile::new(path)),
        }
    }

    /// Creates a repository in the platform data directory.
    pub fn default_location() -> Result<Self> {
        let data_dir = SlotsPaths::data_dir().map_err(|e| LedgerError::storage(e.to_string()))?;
        Ok(Self::new(data_dir))
    }

    /// Path of the backing ledger file.
    pub fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    async fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&LedgerState) -> T + Send + 'static,
        T: Send + 'static,
    {
        let file = Arc::clone(&self.file);
        task::spawn_blocking(move || -> Result<T> {
            let state = file.load()?.unwrap_or_else(LedgerState::new);
            Ok(f(&state))
        })
        .await
        .map_err(|e| LedgerError::storage(format!("Failed to spawn blocking task: {}", e)))?
    }

    async fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut LedgerState) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let file = Arc::clone(&self.file);
        task::spawn_blocking(move || file.update(LedgerState::new, f))
            .await
            .map_err(|e| LedgerError::storage(format!("Failed to spawn blocking task: {}", e)))?
    }
}

#[async_trait]
impl LedgerRepository for TomlLedgerRepository {
    async fn find_account(&self, id: &str) -> Result<Option<Account>> {
        let id = id.to_string();
        self.read(move |state| state.account(&id).cloned()).await
    }

    async fn find_session(&self, account_id: &str) -> Result<Option<Session>> {
        let account_id = account_id.to_string();
        self.read(move |state| state.session_for(&account_id).cloned())
            .await
    }

    async fn reserve_session_id(&self) -> Result<u64> {
        self.write(|state| Ok(state.reserve_session_id())).await
    }

    async fn commit(&self, changes: Vec<LedgerChange>) -> Result<()> {
        let count = changes.len();
        let result = self.write(move |state| state.apply(changes)).await;

        match &result {
            Ok(()) => tracing::debug!(
                "Committed {} ledger change(s) to {}",
                count,
                self.file.path().display()
            ),
            Err(e) if e.is_storage() => tracing::warn!(
                "Failed to write ledger {}: {}",
                self.file.path().display(),
                e
            ),
            Err(e) => tracing::debug!("Rejected ledger batch: {}", e),
        }

        result
    }
}
