//! Failure rendering and process exit codes.

use serde_json::json;
use slots_core::LedgerError;

/// Kind reported for failures outside the ledger (config, arguments, I/O).
const GENERAL_KIND: &str = "general";

pub struct Failure {
    pub message: String,
    pub kind: &'static str,
    pub code: u8,
}

impl Failure {
    pub fn from_error(err: &anyhow::Error) -> Self {
        let ledger_error = err.chain().find_map(|cause| cause.downcast_ref::<LedgerError>());
        let kind = ledger_error.map_or(GENERAL_KIND, LedgerError::kind);

        Self {
            message: format!("{:#}", err),
            kind,
            code: code_for(kind),
        }
    }

    pub fn to_json(&self) -> String {
        json!({ "error": self.message, "kind": self.kind }).to_string()
    }
}

/// Stable per-kind exit codes; `1` is anything unclassified.
pub fn code_for(kind: &str) -> u8 {
    match kind {
        "not_found" => 2,
        "duplicate_id" => 3,
        "bad_allocation" => 4,
        "session_conflict" => 5,
        "insufficient_balance" => 6,
        "validation" => 7,
        "storage" => 8,
        "conflict" => 9,
        _ => 1,
    }
}
