//! Ledger domain models.
//!
//! `Account` and `Session` are the entities; `LedgerState` is the aggregate
//! every storage backend persists, and `LedgerChange` is the unit of mutation
//! applied to it.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Balance an account starts with when the caller doesn't provide one.
pub const DEFAULT_ACCOUNT_BALANCE: u64 = 10;

/// Largest balance any account or session may hold.
///
/// Every backend has to store it; TOML integers are signed 64-bit.
pub const MAX_BALANCE: u64 = i64::MAX as u64;

/// Rejects balances above [`MAX_BALANCE`].
pub fn check_balance(balance: u64) -> Result<u64> {
    if balance > MAX_BALANCE {
        return Err(LedgerError::validation(format!(
            "balance {} exceeds the maximum of {}",
            balance, MAX_BALANCE
        )));
    }
    Ok(balance)
}

/// A durable balance owned by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Caller-assigned, stable identifier
    pub id: String,
    /// Durable currency units
    pub balance: u64,
    /// Timestamp when the account was created (RFC 3339)
    pub created_at: String,
    /// Timestamp of the last balance change (RFC 3339)
    pub updated_at: String,
}

impl Account {
    pub fn new(id: impl Into<String>, balance: u64) -> Self {
        let now = now();
        Self {
            id: id.into(),
            balance,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Returns a copy holding `balance`, stamped with the current time.
    pub fn with_balance(&self, balance: u64) -> Self {
        Self {
            balance,
            updated_at: now(),
            ..self.clone()
        }
    }
}

/// The part of an account's balance currently in play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Ledger-assigned identifier
    pub id: u64,
    /// Owning account
    pub account_id: String,
    /// Currency units in play
    pub balance: u64,
    /// Timestamp when the session was opened (RFC 3339)
    pub created_at: String,
    /// Timestamp of the last balance change (RFC 3339)
    pub updated_at: String,
}

impl Session {
    pub fn new(id: u64, account_id: impl Into<String>, balance: u64) -> Self {
        let now = now();
        Self {
            id,
            account_id: account_id.into(),
            balance,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Returns a copy holding `balance`, stamped with the current time.
    pub fn with_balance(&self, balance: u64) -> Self {
        Self {
            balance,
            updated_at: now(),
            ..self.clone()
        }
    }

    /// Applies a signed delta, refusing to go below zero or above [`MAX_BALANCE`].
    pub fn apply_delta(&self, delta: i64) -> Result<Self> {
        let balance = if delta >= 0 {
            let credited = self
                .balance
                .checked_add(delta.unsigned_abs())
                .ok_or_else(|| LedgerError::validation("session balance overflow"))?;
            check_balance(credited)?
        } else {
            self.balance
                .checked_sub(delta.unsigned_abs())
                .ok_or(LedgerError::InsufficientBalance {
                    balance: self.balance,
                })?
        };
        Ok(self.with_balance(balance))
    }
}

/// Read-only view of both balances of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    pub account_balance: u64,
    pub session_balance: u64,
}

/// One entity mutation inside an atomic batch.
///
/// Updates and deletes carry the balance they were computed from. The batch
/// fails with `Conflict` when the stored balance no longer matches, so a
/// writer that read stale state can't overwrite a newer one. Balances above
/// [`MAX_BALANCE`] fail with `Validation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerChange {
    /// Fails with `DuplicateId` if the id is taken.
    InsertAccount(Account),
    /// Fails with `NotFound` if the account doesn't exist.
    UpdateAccount {
        account: Account,
        expected_balance: u64,
    },
    /// Fails with `NotFound` for an unknown account and `SessionConflict`
    /// if the account already has a session.
    InsertSession(Session),
    /// Fails with `NotFound` unless the account's live session has this id.
    UpdateSession {
        session: Session,
        expected_balance: u64,
    },
    /// Fails with `NotFound` unless the account's live session has this id.
    DeleteSession {
        account_id: String,
        session_id: u64,
        expected_balance: u64,
    },
}

impl LedgerChange {
    /// Replaces `previous` with `account`, provided it is unchanged.
    pub fn update_account(previous: &Account, account: Account) -> Self {
        Self::UpdateAccount {
            account,
            expected_balance: previous.balance,
        }
    }

    /// Replaces `previous` with `session`, provided it is unchanged.
    pub fn update_session(previous: &Session, session: Session) -> Self {
        Self::UpdateSession {
            session,
            expected_balance: previous.balance,
        }
    }

    /// Removes `session`, provided it is unchanged.
    pub fn delete_session(session: &Session) -> Self {
        Self::DeleteSession {
            account_id: session.account_id.clone(),
            session_id: session.id,
            expected_balance: session.balance,
        }
    }
}

/// Everything the ledger persists.
///
/// Sessions are keyed by their owning account, which makes "at most one live
/// session per account" structural.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Id handed to the next session opened
    #[serde(default = "first_session_id")]
    pub next_session_id: u64,
    #[serde(default)]
    pub accounts: BTreeMap<String, Account>,
    #[serde(default)]
    pub sessions: BTreeMap<String, Session>,
}

fn first_session_id() -> u64 {
    1
}

impl LedgerState {
    pub fn new() -> Self {
        Self {
            next_session_id: first_session_id(),
            ..Self::default()
        }
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn session_for(&self, account_id: &str) -> Option<&Session> {
        self.sessions.get(account_id)
    }

    /// Reserves a fresh session id.
    pub fn reserve_session_id(&mut self) -> u64 {
        let id = self.next_session_id.max(first_session_id());
        self.next_session_id = id + 1;
        id
    }

    /// Applies a batch all-or-nothing.
    ///
    /// The batch runs against a copy; `self` is only replaced once every
    /// change has been accepted.
    pub fn apply(&mut self, changes: Vec<LedgerChange>) -> Result<()> {
        let mut next = self.clone();
        for change in changes {
            next.apply_one(change)?;
        }
        *self = next;
        Ok(())
    }

    fn apply_one(&mut self, change: LedgerChange) -> Result<()> {
        match change {
            LedgerChange::InsertAccount(account) => {
                check_balance(account.balance)?;
                if self.accounts.contains_key(&account.id) {
                    return Err(LedgerError::DuplicateId(account.id));
                }
                self.accounts.insert(account.id.clone(), account);
            }
            LedgerChange::UpdateAccount {
                account,
                expected_balance,
            } => {
                check_balance(account.balance)?;
                let slot = self
                    .accounts
                    .get_mut(&account.id)
                    .ok_or_else(|| LedgerError::account_not_found(&account.id))?;
                if slot.balance != expected_balance {
                    return Err(LedgerError::conflict("account", account.id));
                }
                *slot = account;
            }
            LedgerChange::InsertSession(session) => {
                check_balance(session.balance)?;
                if !self.accounts.contains_key(&session.account_id) {
                    return Err(LedgerError::account_not_found(&session.account_id));
                }
                if self.sessions.contains_key(&session.account_id) {
                    return Err(LedgerError::SessionConflict {
                        account_id: session.account_id,
                    });
                }
                self.next_session_id = self.next_session_id.max(session.id + 1);
                self.sessions.insert(session.account_id.clone(), session);
            }
            LedgerChange::UpdateSession {
                session,
                expected_balance,
            } => {
                check_balance(session.balance)?;
                let slot = self
                    .sessions
                    .get_mut(&session.account_id)
                    .filter(|live| live.id == session.id)
                    .ok_or_else(|| LedgerError::not_found("session", session.id.to_string()))?;
                if slot.balance != expected_balance {
                    return Err(LedgerError::conflict("session", session.id.to_string()));
                }
                *slot = session;
            }
            LedgerChange::DeleteSession {
                account_id,
                session_id,
                expected_balance,
            } => match self.sessions.get(&account_id) {
                Some(live) if live.id == session_id => {
                    if live.balance != expected_balance {
                        return Err(LedgerError::conflict("session", session_id.to_string()));
                    }
                    self.sessions.remove(&account_id);
                }
                _ => return Err(LedgerError::not_found("session", session_id.to_string())),
            },
        }
        Ok(())
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
