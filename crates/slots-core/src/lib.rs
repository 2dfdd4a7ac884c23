//! Domain layer for the slots service: payout table, roll engine and ledger.

pub mod error;
pub mod ledger;
pub mod roll;

// Re-export common error type
pub use error::{LedgerError, Result};
