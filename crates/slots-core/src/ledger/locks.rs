use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-account async locks.
///
/// Holding the guard for an account id serializes every ledger mutation on
/// that account. Different accounts never contend.
#[derive(Default)]
pub struct AccountLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `account_id`.
    pub async fn acquire(&self, account_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries only the map still references are idle.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(account_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of accounts with a held or awaited lock.
    pub fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}
