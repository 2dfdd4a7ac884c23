//! Application configuration loaded from `config.toml`.
//!
//! Every field has a default, so a missing or empty file is a valid config.

use serde::{Deserialize, Serialize};
use slots_core::ledger::{DEFAULT_ACCOUNT_BALANCE, LedgerRepository};
use slots_core::roll::RerollPolicy;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::in_memory_ledger_repository::InMemoryLedgerRepository;
use crate::paths::{PathError, SlotsPaths};
use crate::toml_ledger_repository::TomlLedgerRepository;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{0}")]
    Path(#[from] PathError),
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotsConfig {
    pub storage: StorageConfig,
    pub game: GameConfig,
}

/// Where the ledger lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory holding `ledger.toml`; the platform data directory when unset
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local; state is lost on exit
    Memory,
    #[default]
    Toml,
}

/// Game tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Balance of accounts created without an explicit one
    pub default_balance: u64,
    pub reroll_policy: RerollPolicy,
    /// Seeds the roll source; entropy when unset
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_balance: DEFAULT_ACCOUNT_BALANCE,
            reroll_policy: RerollPolicy::default(),
            seed: None,
        }
    }
}

impl SlotsConfig {
    /// Loads the config at `path`, falling back to defaults if it doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `<config_dir>/slots/config.toml`.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&SlotsPaths::config_file()?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

impl StorageConfig {
    /// Resolved directory for the TOML backend.
    pub fn resolved_data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => SlotsPaths::data_dir(),
        }
    }

    /// Builds the repository this config describes.
    pub fn open_repository(&self) -> Result<Arc<dyn LedgerRepository>, ConfigError> {
        match self.backend {
            StorageBackend::Memory => {
                tracing::debug!("Using in-memory ledger");
                Ok(Arc::new(InMemoryLedgerRepository::new()))
            }
            StorageBackend::Toml => {
                let repo = TomlLedgerRepository::new(self.resolved_data_dir()?);
                tracing::debug!("Using ledger file {}", repo.path().display());
                Ok(Arc::new(repo))
            }
        }
    }
}
