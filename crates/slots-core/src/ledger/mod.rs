//! Ledger domain module.
//!
//! # Module Structure
//!
//! - `model`: `Account`, `Session`, the persisted `LedgerState` and `LedgerChange`
//! - `repository`: storage trait (`LedgerRepository`)
//! - `locks`: per-account serialization (`AccountLocks`)
//! - `manager`: balance-mutating operations (`Ledger`)

mod locks;
mod manager;
mod model;
mod repository;

pub use locks::AccountLocks;
pub use manager::{Allocation, Ledger, MAX_COMMIT_ATTEMPTS};
pub use model::{
    Account, BalanceSnapshot, DEFAULT_ACCOUNT_BALANCE, LedgerChange, LedgerState, MAX_BALANCE,
    Session, check_balance,
};
pub use repository::LedgerRepository;
