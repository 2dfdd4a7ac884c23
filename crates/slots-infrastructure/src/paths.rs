//! Unified path management for slots configuration and ledger files.
//!
//! ```text
//! ~/.config/slots/             # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/slots/        # Data directory (default ledger location)
//! └── ledger.toml              # Accounts, sessions and the session id counter
//! ```

use std::path::{Path, PathBuf};

const APP_DIR: &str = "slots";
const CONFIG_FILE: &str = "config.toml";
const LEDGER_FILE: &str = "ledger.toml";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
    /// Platform data directory could not be determined.
    DataDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
            PathError::DataDirNotFound => write!(f, "Cannot find data directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Platform-appropriate locations for slots files.
pub struct SlotsPaths;

impl SlotsPaths {
    /// Returns the slots configuration directory (e.g., `~/.config/slots/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the slots data directory (e.g., `~/.local/share/slots/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::DataDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Returns the ledger file inside `data_dir`.
    pub fn ledger_file(data_dir: &Path) -> PathBuf {
        data_dir.join(LEDGER_FILE)
    }
}
