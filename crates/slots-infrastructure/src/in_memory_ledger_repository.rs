//! Process-local ledger repository.
//!
//! Everything lives in a single `LedgerState` behind a mutex; nothing
//! survives the process.

use async_trait::async_trait;
use slots_core::{
    error::{LedgerError, Result},
    ledger::{Account, LedgerChange, LedgerRepository, LedgerState, Session},
};
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory implementation of `LedgerRepository`.
///
/// Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct InMemoryLedgerRepository {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedgerRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState::new())),
        }
    }

    /// Returns a copy of everything currently stored.
    pub fn snapshot(&self) -> Result<LedgerState> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>> {
        self.state
            .lock()
            .map_err(|_| LedgerError::storage("in-memory ledger lock poisoned"))
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn find_account(&self, id: &str) -> Result<Option<Account>> {
        Ok(self.lock()?.account(id).cloned())
    }

    async fn find_session(&self, account_id: &str) -> Result<Option<Session>> {
        Ok(self.lock()?.session_for(account_id).cloned())
    }

    async fn reserve_session_id(&self) -> Result<u64> {
        Ok(self.lock()?.reserve_session_id())
    }

    async fn commit(&self, changes: Vec<LedgerChange>) -> Result<()> {
        self.lock()?.apply(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commit_and_read_back() {
        let repo = InMemoryLedgerRepository::new();
        repo.commit(vec![LedgerChange::InsertAccount(Account::new("alice", 10))])
            .await
            .unwrap();

        let account = repo.find_account("alice").await.unwrap().unwrap();
        assert_eq!(account.balance, 10);
        assert!(repo.find_account("bob").await.unwrap().is_none());
        assert!(repo.find_session("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejected_batch_is_not_applied() {
        let repo = InMemoryLedgerRepository::new();
        repo.commit(vec![LedgerChange::InsertAccount(Account::new("alice", 10))])
            .await
            .unwrap();

        let err = repo
            .commit(vec![
                LedgerChange::UpdateAccount {
                    account: Account::new("alice", 0),
                    expected_balance: 10,
                },
                LedgerChange::InsertSession(Session::new(1, "nobody", 10)),
            ])
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(repo.find_account("alice").await.unwrap().unwrap().balance, 10);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let repo = InMemoryLedgerRepository::new();
        let other = repo.clone();

        other
            .commit(vec![LedgerChange::InsertAccount(Account::new("alice", 3))])
            .await
            .unwrap();

        assert!(repo.find_account("alice").await.unwrap().is_some());
        assert_eq!(repo.reserve_session_id().await.unwrap(), 1);
        assert_eq!(other.reserve_session_id().await.unwrap(), 2);
        assert_eq!(repo.snapshot().unwrap().next_session_id, 3);
    }
}
