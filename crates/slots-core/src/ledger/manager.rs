//! Balance-mutating ledger operations.

use super::locks::AccountLocks;
use super::model::{Account, BalanceSnapshot, LedgerChange, Session, check_balance};
use super::repository::LedgerRepository;
use crate::error::{LedgerError, Result};
use std::sync::Arc;

/// How many times a read-modify-write is retried after another writer
/// sharing the same storage committed first.
pub const MAX_COMMIT_ATTEMPTS: usize = 64;

/// Result of moving funds from an account into a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// The account after the debit
    pub account: Account,
    /// The freshly opened session
    pub session: Session,
}

/// Owns every balance mutation on accounts and sessions.
///
/// Each mutating operation takes the account's lock, re-reads the persisted
/// state, validates, and commits a single atomic batch. The entities passed
/// in only identify what to operate on; their balances are never trusted.
///
/// The lock only covers this process. Every batch is therefore also a
/// compare-and-set against the balances it was computed from; when another
/// writer got there first the operation starts over from a fresh read.
pub struct Ledger {
    repository: Arc<dyn LedgerRepository>,
    locks: AccountLocks,
}

impl Ledger {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Self {
            repository,
            locks: AccountLocks::new(),
        }
    }

    /// Loads an account, failing with `NotFound` when it doesn't exist.
    pub async fn account(&self, id: &str) -> Result<Account> {
        self.repository
            .find_account(id)
            .await?
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    /// Loads the live session of an account, if any.
    pub async fn session_for(&self, account_id: &str) -> Result<Option<Session>> {
        self.repository.find_session(account_id).await
    }

    /// Creates an account holding `balance`.
    ///
    /// Balances above `MAX_BALANCE` fail with `Validation`.
    pub async fn open_account(&self, id: &str, balance: u64) -> Result<Account> {
        check_balance(balance)?;
        let _guard = self.locks.acquire(id).await;

        let account = Account::new(id, balance);
        self.repository
            .commit(vec![LedgerChange::InsertAccount(account.clone())])
            .await?;
        Ok(account)
    }

    /// Moves `amount` (everything when `None`) from the account into a new session.
    ///
    /// # Errors
    ///
    /// - `NotFound`: the account doesn't exist
    /// - `SessionConflict`: the account already has a live session
    /// - `BadAllocation`: `amount` exceeds the account balance
    pub async fn allocate(&self, account: &Account, amount: Option<u64>) -> Result<Allocation> {
        let _guard = self.locks.acquire(&account.id).await;

        let mut attempt = 1;
        loop {
            match self.try_allocate(&account.id, amount).await {
                Err(e) if e.is_conflict() && attempt < MAX_COMMIT_ATTEMPTS => {
                    attempt += 1;
                    tokio::task::yield_now().await;
                }
                result => return result,
            }
        }
    }

    async fn try_allocate(&self, account_id: &str, amount: Option<u64>) -> Result<Allocation> {
        let current = self.account(account_id).await?;
        if self.repository.find_session(&current.id).await?.is_some() {
            return Err(LedgerError::SessionConflict {
                account_id: current.id,
            });
        }

        let requested = amount.unwrap_or(current.balance);
        if requested > current.balance {
            return Err(LedgerError::BadAllocation {
                requested,
                available: current.balance,
            });
        }

        let session_id = self.repository.reserve_session_id().await?;
        let session = Session::new(session_id, &current.id, requested);
        let account = current.with_balance(current.balance - requested);

        self.repository
            .commit(vec![
                LedgerChange::update_account(&current, account.clone()),
                LedgerChange::InsertSession(session.clone()),
            ])
            .await?;

        Ok(Allocation { account, session })
    }

    /// Applies a signed delta to the session balance.
    ///
    /// Fails with `InsufficientBalance`, without mutating, when the delta would
    /// take the balance below zero.
    pub async fn debit_session(&self, session: &Session, delta: i64) -> Result<Session> {
        let (session, ()) = self
            .transact_session(session, |_| Ok((delta, ())))
            .await?;
        Ok(session)
    }

    /// Read-modify-write on the persisted session.
    ///
    /// `f` receives the current session under the account lock and returns
    /// the balance delta to apply plus a value handed back to the caller. If
    /// `f` fails, or the delta would go negative, nothing is written. `f` runs
    /// again on a fresh read whenever the commit loses to another writer;
    /// only the output of the committed run is returned.
    pub async fn transact_session<T, F>(&self, session: &Session, mut f: F) -> Result<(Session, T)>
    where
        F: FnMut(&Session) -> Result<(i64, T)> + Send,
        T: Send,
    {
        let _guard = self.locks.acquire(&session.account_id).await;

        let mut attempt = 1;
        loop {
            let current = self.live_session(session).await?;
            let (delta, output) = f(&current)?;
            let updated = current.apply_delta(delta)?;

            let committed = self
                .repository
                .commit(vec![LedgerChange::update_session(&current, updated.clone())])
                .await;

            match committed {
                Ok(()) => return Ok((updated, output)),
                Err(e) if e.is_conflict() && attempt < MAX_COMMIT_ATTEMPTS => {
                    attempt += 1;
                    tokio::task::yield_now().await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Credits the session balance back to the account and removes the session.
    pub async fn settle(&self, account: &Account, session: &Session) -> Result<Account> {
        if session.account_id != account.id {
            return Err(LedgerError::validation(format!(
                "session {} does not belong to account '{}'",
                session.id, account.id
            )));
        }

        let _guard = self.locks.acquire(&account.id).await;

        let mut attempt = 1;
        loop {
            match self.try_settle(&account.id, session).await {
                Err(e) if e.is_conflict() && attempt < MAX_COMMIT_ATTEMPTS => {
                    attempt += 1;
                    tokio::task::yield_now().await;
                }
                result => return result,
            }
        }
    }

    async fn try_settle(&self, account_id: &str, session: &Session) -> Result<Account> {
        let current = self.account(account_id).await?;
        let live = self.live_session(session).await?;
        let balance = current
            .balance
            .checked_add(live.balance)
            .ok_or_else(|| LedgerError::validation("account balance overflow"))?;
        let account = current.with_balance(check_balance(balance)?);

        self.repository
            .commit(vec![
                LedgerChange::update_account(&current, account.clone()),
                LedgerChange::delete_session(&live),
            ])
            .await?;

        Ok(account)
    }

    /// Both balances of an account; the session balance is `0` without a session.
    pub fn snapshot(account: &Account, session: Option<&Session>) -> BalanceSnapshot {
        BalanceSnapshot {
            account_balance: account.balance,
            session_balance: session.map_or(0, |session| session.balance),
        }
    }

    async fn live_session(&self, session: &Session) -> Result<Session> {
        self.repository
            .find_session(&session.account_id)
            .await?
            .filter(|live| live.id == session.id)
            .ok_or_else(|| LedgerError::not_found("session", session.id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::model::{LedgerState, MAX_BALANCE};
    use async_trait::async_trait;
    use std::sync::Mutex;

    // Mock LedgerRepository for testing
    #[derive(Default)]
    struct MockLedgerRepository {
        state: Mutex<LedgerState>,
        fail_commits: bool,
        // Commits by another writer that land just before ours
        foreign_debits: Mutex<u32>,
    }

    impl MockLedgerRepository {
        fn failing() -> Self {
            Self {
                fail_commits: true,
                ..Self::default()
            }
        }

        fn debit_every_session(state: &mut LedgerState) {
            let changes = state
                .sessions
                .values()
                .map(|live| LedgerChange::update_session(live, live.apply_delta(-1).unwrap()))
                .collect();
            state.apply(changes).unwrap();
        }
    }

    #[async_trait]
    impl LedgerRepository for MockLedgerRepository {
        async fn find_account(&self, id: &str) -> Result<Option<Account>> {
            Ok(self.state.lock().unwrap().account(id).cloned())
        }

        async fn find_session(&self, account_id: &str) -> Result<Option<Session>> {
            Ok(self.state.lock().unwrap().session_for(account_id).cloned())
        }

        async fn reserve_session_id(&self) -> Result<u64> {
            Ok(self.state.lock().unwrap().reserve_session_id())
        }

        async fn commit(&self, changes: Vec<LedgerChange>) -> Result<()> {
            if self.fail_commits {
                return Err(LedgerError::storage("disk on fire"));
            }
            let mut state = self.state.lock().unwrap();
            let mut foreign = self.foreign_debits.lock().unwrap();
            if *foreign > 0 && !state.sessions.is_empty() {
                *foreign -= 1;
                Self::debit_every_session(&mut state);
            }
            state.apply(changes)
        }
    }

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(MockLedgerRepository::default()))
    }

    #[tokio::test]
    async fn test_allocate_moves_exact_amount() {
        let ledger = ledger();
        let account = ledger.open_account("alice", 100).await.unwrap();

        let allocation = ledger.allocate(&account, Some(30)).await.unwrap();

        assert_eq!(allocation.account.balance, 70);
        assert_eq!(allocation.session.balance, 30);
        assert_eq!(allocation.session.account_id, "alice");
        assert_eq!(ledger.account("alice").await.unwrap().balance, 70);
    }

    #[tokio::test]
    async fn test_allocate_defaults_to_everything() {
        let ledger = ledger();
        let account = ledger.open_account("alice", 25).await.unwrap();

        let allocation = ledger.allocate(&account, None).await.unwrap();

        assert_eq!(allocation.account.balance, 0);
        assert_eq!(allocation.session.balance, 25);
    }

    #[tokio::test]
    async fn test_allocate_beyond_balance_changes_nothing() {
        let ledger = ledger();
        let account = ledger.open_account("alice", 10).await.unwrap();

        let err = ledger.allocate(&account, Some(11)).await.unwrap_err();

        assert_eq!(
            err,
            LedgerError::BadAllocation {
                requested: 11,
                available: 10
            }
        );
        assert_eq!(ledger.account("alice").await.unwrap().balance, 10);
        assert!(ledger.session_for("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_allocate_uses_persisted_balance() {
        let ledger = ledger();
        let account = ledger.open_account("alice", 10).await.unwrap();
        let stale = account.with_balance(1_000);

        let err = ledger.allocate(&stale, Some(500)).await.unwrap_err();

        assert!(matches!(err, LedgerError::BadAllocation { available: 10, .. }));
    }

    #[tokio::test]
    async fn test_allocate_twice_conflicts() {
        let ledger = ledger();
        let account = ledger.open_account("alice", 10).await.unwrap();
        let first = ledger.allocate(&account, Some(5)).await.unwrap();

        let err = ledger.allocate(&first.account, Some(1)).await.unwrap_err();

        assert!(matches!(err, LedgerError::SessionConflict { .. }));
        assert_eq!(ledger.account("alice").await.unwrap().balance, 5);
    }

    #[tokio::test]
    async fn test_allocate_unknown_account() {
        let ledger = ledger();
        let ghost = Account::new("ghost", 10);

        let err = ledger.allocate(&ghost, Some(1)).await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_debit_session_rejects_negative_result() {
        let ledger = ledger();
        let account = ledger.open_account("alice", 3).await.unwrap();
        let session = ledger.allocate(&account, None).await.unwrap().session;

        let err = ledger.debit_session(&session, -4).await.unwrap_err();
        assert_eq!(err, LedgerError::InsufficientBalance { balance: 3 });

        let session = ledger.debit_session(&session, -3).await.unwrap();
        assert_eq!(session.balance, 0);

        let session = ledger.debit_session(&session, 20).await.unwrap();
        assert_eq!(session.balance, 20);
    }

    #[tokio::test]
    async fn test_transact_session_failure_writes_nothing() {
        let ledger = ledger();
        let account = ledger.open_account("alice", 5).await.unwrap();
        let session = ledger.allocate(&account, None).await.unwrap().session;

        let result: Result<(Session, ())> = ledger
            .transact_session(&session, |_| Err(LedgerError::validation("nope")))
            .await;

        assert!(result.is_err());
        let live = ledger.session_for("alice").await.unwrap().unwrap();
        assert_eq!(live.balance, 5);
    }

    #[tokio::test]
    async fn test_transact_session_retries_after_foreign_commit() {
        let repo = Arc::new(MockLedgerRepository::default());
        let ledger = Ledger::new(repo.clone());
        let account = ledger.open_account("alice", 10).await.unwrap();
        let session = ledger.allocate(&account, None).await.unwrap().session;
        *repo.foreign_debits.lock().unwrap() = 2;

        let mut seen = Vec::new();
        let (updated, runs) = ledger
            .transact_session(&session, |current| {
                seen.push(current.balance);
                Ok((-1, seen.len()))
            })
            .await
            .unwrap();

        // Two foreign debits, each forcing a fresh read, then ours lands.
        assert_eq!(seen, vec![10, 9, 8]);
        assert_eq!(runs, 3);
        assert_eq!(updated.balance, 7);
        assert_eq!(ledger.session_for("alice").await.unwrap().unwrap().balance, 7);
    }

    #[tokio::test]
    async fn test_settle_never_cashes_out_stale_balance() {
        let repo = Arc::new(MockLedgerRepository::default());
        let ledger = Ledger::new(repo.clone());
        let account = ledger.open_account("alice", 10).await.unwrap();
        let allocation = ledger.allocate(&account, Some(6)).await.unwrap();
        *repo.foreign_debits.lock().unwrap() = 1;

        let account = ledger
            .settle(&allocation.account, &allocation.session)
            .await
            .unwrap();

        assert_eq!(account.balance, 4 + 5);
        assert!(ledger.session_for("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persistent_conflict_is_surfaced() {
        let repo = Arc::new(MockLedgerRepository::default());
        let ledger = Ledger::new(repo.clone());
        let account = ledger.open_account("alice", 1_000).await.unwrap();
        let session = ledger.allocate(&account, None).await.unwrap().session;
        *repo.foreign_debits.lock().unwrap() = MAX_COMMIT_ATTEMPTS as u32;

        let err = ledger.debit_session(&session, -1).await.unwrap_err();

        assert!(err.is_conflict());
        let live = ledger.session_for("alice").await.unwrap().unwrap();
        assert_eq!(live.balance, 1_000 - MAX_COMMIT_ATTEMPTS as u64);
    }

    #[tokio::test]
    async fn test_open_account_above_cap_rejected() {
        let ledger = ledger();

        let err = ledger.open_account("big", u64::MAX).await.unwrap_err();

        assert_eq!(err.kind(), "validation");
        assert!(ledger.account("big").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_settle_above_cap_rejected() {
        let ledger = ledger();
        let account = ledger.open_account("alice", MAX_BALANCE).await.unwrap();
        let allocation = ledger.allocate(&account, Some(1)).await.unwrap();
        let session = ledger.debit_session(&allocation.session, 1).await.unwrap();

        let err = ledger.settle(&allocation.account, &session).await.unwrap_err();

        assert_eq!(err.kind(), "validation");
        assert!(ledger.session_for("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_settle_merges_and_removes_session() {
        let ledger = ledger();
        let account = ledger.open_account("alice", 100).await.unwrap();
        let allocation = ledger.allocate(&account, Some(50)).await.unwrap();
        let session = ledger.debit_session(&allocation.session, 7).await.unwrap();

        let account = ledger.settle(&allocation.account, &session).await.unwrap();

        assert_eq!(account.balance, 107);
        assert!(ledger.session_for("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_settle_twice_fails() {
        let ledger = ledger();
        let account = ledger.open_account("alice", 10).await.unwrap();
        let allocation = ledger.allocate(&account, None).await.unwrap();
        ledger
            .settle(&allocation.account, &allocation.session)
            .await
            .unwrap();

        let err = ledger
            .settle(&allocation.account, &allocation.session)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(ledger.account("alice").await.unwrap().balance, 10);
    }

    #[tokio::test]
    async fn test_settle_rejects_foreign_session() {
        let ledger = ledger();
        let alice = ledger.open_account("alice", 10).await.unwrap();
        let bob = ledger.open_account("bob", 10).await.unwrap();
        let bob_session = ledger.allocate(&bob, None).await.unwrap().session;

        let err = ledger.settle(&alice, &bob_session).await.unwrap_err();

        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn test_duplicate_open_account() {
        let ledger = ledger();
        ledger.open_account("alice", 10).await.unwrap();

        let err = ledger.open_account("alice", 50).await.unwrap_err();

        assert_eq!(err, LedgerError::DuplicateId("alice".to_string()));
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let ledger = Ledger::new(Arc::new(MockLedgerRepository::failing()));

        let err = ledger.open_account("alice", 10).await.unwrap_err();

        assert!(err.is_storage());
    }

    #[test]
    fn test_snapshot() {
        let account = Account::new("alice", 40);
        let session = Session::new(1, "alice", 12);

        assert_eq!(
            Ledger::snapshot(&account, Some(&session)),
            BalanceSnapshot {
                account_balance: 40,
                session_balance: 12
            }
        );
        assert_eq!(Ledger::snapshot(&account, None).session_balance, 0);
    }
}
