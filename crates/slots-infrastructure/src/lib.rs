//! Storage backends, paths and configuration for the slots ledger.

pub mod config;
pub mod in_memory_ledger_repository;
pub mod paths;
pub mod storage;
pub mod toml_ledger_repository;

pub use crate::config::{ConfigError, GameConfig, SlotsConfig, StorageBackend, StorageConfig};
pub use crate::in_memory_ledger_repository::InMemoryLedgerRepository;
pub use crate::paths::SlotsPaths;
pub use crate::toml_ledger_repository::TomlLedgerRepository;
