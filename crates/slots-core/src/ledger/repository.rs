//! Ledger repository trait.
//!
//! Defines the interface for ledger persistence operations.

use super::model::{Account, LedgerChange, Session};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract store for accounts and sessions.
///
/// This trait decouples the ledger from the storage mechanism (memory, TOML
/// file, database).
///
/// # Implementation Notes
///
/// Implementations must:
/// - Apply a `commit` batch all-or-nothing, with the per-change rules
///   documented on [`LedgerChange`]
/// - Report every persistence failure as `LedgerError::Storage`
/// - Never hand out the same session id twice
///
/// Serializing concurrent read-modify-write cycles on one account is the
/// ledger's job, not the repository's.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Finds an account by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Account))`: Account found
    /// - `Ok(None)`: Account not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_account(&self, id: &str) -> Result<Option<Account>>;

    /// Finds the live session of an account, if any.
    async fn find_session(&self, account_id: &str) -> Result<Option<Session>>;

    /// Reserves a fresh session id.
    async fn reserve_session_id(&self) -> Result<u64>;

    /// Applies a batch of changes atomically.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Every change was applied
    /// - `Err(_)`: Nothing was applied
    async fn commit(&self, changes: Vec<LedgerChange>) -> Result<()>;
}
