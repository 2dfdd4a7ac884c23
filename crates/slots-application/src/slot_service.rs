//! Slot service use-cases.
//!
//! `SlotService` is the one entry point transports talk to. It composes the
//! `Ledger` (balance math and persistence) with the `RollEngine` (payouts)
//! and hands back plain result objects.

use serde::Serialize;
use slots_core::error::{LedgerError, Result};
use slots_core::ledger::{Account, Ledger, LedgerRepository, Session};
use slots_core::roll::{Reels, RollEngine, RollSource, RngSource};
use slots_infrastructure::{ConfigError, SlotsConfig};
use std::sync::{Arc, Mutex, PoisonError};

/// Price of one spin, in currency units.
pub const ROLL_COST: u64 = 1;

/// Outcome of `create_session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreation {
    pub account_id: String,
    pub session_id: u64,
    pub session_balance: u64,
    pub account_balance: u64,
}

/// Outcome of `roll`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollResult {
    pub roll_result: Reels,
    pub new_balance: u64,
}

/// Read-only view returned by `get_account`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub session_balance: u64,
    pub account_balance: u64,
}

/// Use-case façade over the ledger and the roll engine.
///
/// # Thread Safety
///
/// The service is shared behind an `Arc`. Balance mutations are serialized
/// per account by the `Ledger`; the roll source sits behind its own mutex and
/// is only touched inside the ledger's read-modify-write of a session.
pub struct SlotService {
    ledger: Ledger,
    engine: RollEngine,
    source: Mutex<Box<dyn RollSource>>,
    default_balance: u64,
}

impl SlotService {
    /// Creates a service that opens accounts with `default_balance`.
    pub fn new(
        repository: Arc<dyn LedgerRepository>,
        engine: RollEngine,
        source: Box<dyn RollSource>,
        default_balance: u64,
    ) -> Self {
        Self {
            ledger: Ledger::new(repository),
            engine,
            source: Mutex::new(source),
            default_balance,
        }
    }

    /// Wires storage, policy and randomness from a loaded configuration.
    pub fn from_config(config: &SlotsConfig) -> std::result::Result<Self, ConfigError> {
        let repository = config.storage.open_repository()?;
        let source: Box<dyn RollSource> = match config.game.seed {
            Some(seed) => Box::new(RngSource::seeded(seed)),
            None => Box::new(RngSource::from_entropy()),
        };

        Ok(Self::new(
            repository,
            RollEngine::new(config.game.reroll_policy),
            source,
            config.game.default_balance,
        ))
    }

    pub fn default_balance(&self) -> u64 {
        self.default_balance
    }

    /// Resolves an account id to the account and its live session, if any.
    pub async fn find_account(&self, id: &str) -> Result<(Account, Option<Session>)> {
        let account = self.ledger.account(id).await?;
        let session = self.ledger.session_for(&account.id).await?;
        Ok((account, session))
    }

    /// Opens a new account; `balance` defaults to the configured starting balance.
    pub async fn create_account(&self, id: &str, balance: Option<u64>) -> Result<Account> {
        if id.trim().is_empty() {
            return Err(LedgerError::validation("account id must not be empty"));
        }

        self.ledger
            .open_account(id, balance.unwrap_or(self.default_balance))
            .await
    }

    /// Moves `amount` (everything when `None`) from the account into a new session.
    ///
    /// # Errors
    ///
    /// - `SessionConflict`: the account already has a live session
    /// - `NotFound`: the account doesn't exist
    /// - `BadAllocation`: `amount` exceeds the account balance
    pub async fn create_session(
        &self,
        account: &Account,
        amount: Option<u64>,
    ) -> Result<SessionCreation> {
        if self.ledger.session_for(&account.id).await?.is_some() {
            return Err(LedgerError::SessionConflict {
                account_id: account.id.clone(),
            });
        }

        let allocation = self.ledger.allocate(account, amount).await?;

        Ok(SessionCreation {
            account_id: allocation.account.id,
            session_id: allocation.session.id,
            session_balance: allocation.session.balance,
            account_balance: allocation.account.balance,
        })
    }

    /// Spins once, charging [`ROLL_COST`] and crediting any win.
    ///
    /// The tier is chosen from the balance before the cost is taken. A
    /// session holding nothing can't roll.
    pub async fn roll(&self, session: &Session) -> Result<RollResult> {
        let engine = self.engine;
        let source = &self.source;

        let (session, symbols) = self
            .ledger
            .transact_session(session, move |current| {
                if current.balance < ROLL_COST {
                    return Err(LedgerError::InsufficientBalance {
                        balance: current.balance,
                    });
                }

                let mut source = source.lock().unwrap_or_else(PoisonError::into_inner);
                let spin = engine.spin(current.balance, &mut **source);

                let delta = spin.win_amount as i64 - ROLL_COST as i64;
                Ok((delta, spin.symbols))
            })
            .await?;

        Ok(RollResult {
            roll_result: symbols,
            new_balance: session.balance,
        })
    }

    /// Merges the session back into the account and closes it.
    ///
    /// Fails with `NotFound` when the account has no active session.
    pub async fn cashout(&self, account: &Account, session: Option<&Session>) -> Result<Account> {
        let session = session.ok_or_else(|| LedgerError::no_active_session(&account.id))?;
        self.ledger.settle(account, session).await
    }

    /// Both balances of an account, without touching storage.
    pub fn get_account(&self, account: &Account, session: Option<&Session>) -> AccountView {
        let snapshot = Ledger::snapshot(account, session);
        AccountView {
            id: account.id.clone(),
            session_balance: snapshot.session_balance,
            account_balance: snapshot.account_balance,
        }
    }
}
