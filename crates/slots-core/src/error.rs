//! Error types for the slots ledger.

use thiserror::Error;

/// A shared error type for the ledger, the roll engine and the storage layer.
///
/// Every failure a use-case can produce is one of these variants, so the
/// transport layer can map them to its own protocol without string matching.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Referenced account or session does not exist
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Account id already in use
    #[error("Account id '{0}' is already taken")]
    DuplicateId(String),

    /// Requested session funding exceeds the account balance
    #[error("Can't allocate {requested}: account balance is {available}")]
    BadAllocation { requested: u64, available: u64 },

    /// The account already has a live session
    #[error("Session already exists for account '{account_id}'")]
    SessionConflict { account_id: String },

    /// Roll attempted (or a debit computed) that the session balance can't cover
    #[error("Insufficient balance: session holds {balance}")]
    InsufficientBalance { balance: u64 },

    /// The persisted entity changed between read and commit
    #[error("Concurrent update of {entity_type} '{id}'")]
    Conflict { entity_type: &'static str, id: String },

    /// Malformed input that made it past the transport layer
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Any persistence failure not otherwise classified
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a NotFound error for an account id
    pub fn account_not_found(id: impl Into<String>) -> Self {
        Self::not_found("account", id)
    }

    /// Creates a NotFound error for the session of an account
    pub fn no_active_session(account_id: impl Into<String>) -> Self {
        Self::not_found("session", account_id)
    }

    /// Creates a Conflict error
    pub fn conflict(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::Conflict {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if this is a Storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Stable, machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::DuplicateId(_) => "duplicate_id",
            Self::BadAllocation { .. } => "bad_allocation",
            Self::SessionConflict { .. } => "session_conflict",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::Conflict { .. } => "conflict",
            Self::Validation(_) => "validation",
            Self::Storage(_) => "storage",
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(format!("JSON: {}", err))
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        Self::Storage(format!("TOML: {}", err))
    }
}

impl From<toml::ser::Error> for LedgerError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Storage(format!("TOML: {}", err))
    }
}

/// A type alias for `Result<T, LedgerError>`.
pub type Result<T> = std::result::Result<T, LedgerError>;
