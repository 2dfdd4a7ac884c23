//! Atomic TOML file operations with ACID guarantees.
//!
//! Provides a thin layer for safe concurrent access to a TOML-backed document,
//! including across processes sharing the same file.

use serde::{Serialize, de::DeserializeOwned};
use slots_core::LedgerError;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Errors that can occur during atomic TOML operations.
#[derive(Debug)]
pub enum AtomicTomlError {
    /// File I/O error.
    IoError(std::io::Error),
    /// TOML deserialization error.
    TomlError(toml::de::Error),
    /// TOML serialization error.
    TomlSerError(toml::ser::Error),
    /// File locking error.
    LockError(String),
}

impl std::fmt::Display for AtomicTomlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomicTomlError::IoError(e) => write!(f, "I/O error: {}", e),
            AtomicTomlError::TomlError(e) => write!(f, "TOML parse error: {}", e),
            AtomicTomlError::TomlSerError(e) => write!(f, "TOML serialization error: {}", e),
            AtomicTomlError::LockError(e) => write!(f, "Lock error: {}", e),
        }
    }
}

impl std::error::Error for AtomicTomlError {}

impl From<std::io::Error> for AtomicTomlError {
    fn from(e: std::io::Error) -> Self {
        AtomicTomlError::IoError(e)
    }
}

impl From<toml::de::Error> for AtomicTomlError {
    fn from(e: toml::de::Error) -> Self {
        AtomicTomlError::TomlError(e)
    }
}

impl From<toml::ser::Error> for AtomicTomlError {
    fn from(e: toml::ser::Error) -> Self {
        AtomicTomlError::TomlSerError(e)
    }
}

impl From<AtomicTomlError> for LedgerError {
    fn from(e: AtomicTomlError) -> Self {
        LedgerError::storage(e.to_string())
    }
}

/// A handle to an atomic TOML file with ACID guarantees.
///
/// Provides:
/// - **Atomicity**: Updates are all-or-nothing via tmp file + atomic rename
/// - **Consistency**: The update closure can veto a write by failing
/// - **Isolation**: An exclusive file lock serializes load-modify-save cycles
/// - **Durability**: Explicit fsync before rename
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a new atomic TOML file handle.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the TOML file and deserializes it.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>, AtomicTomlError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let data: T = toml::from_str(&content)?;
        Ok(Some(data))
    }

    /// Saves data to the TOML file atomically.
    ///
    /// Uses a temporary file + atomic rename to ensure durability.
    pub fn save(&self, data: &T) -> Result<(), AtomicTomlError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(data)?;

        let tmp_path = self.get_temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    /// Performs a transactional update with file locking.
    ///
    /// `f` receives the current document (or `default_value` when the file
    /// doesn't exist yet). The document is written back only when `f`
    /// succeeds; its error is returned untouched otherwise.
    pub fn update<R, E, F>(&self, default_value: impl FnOnce() -> T, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut T) -> Result<R, E>,
        E: From<AtomicTomlError>,
    {
        let _lock = self.acquire_lock()?;

        let mut data = match self.load()? {
            Some(data) => data,
            None => default_value(),
        };

        let output = f(&mut data)?;

        self.save(&data)?;

        Ok(output)
    }

    /// Gets a temporary file path for atomic writes.
    fn get_temp_path(&self) -> Result<PathBuf, AtomicTomlError> {
        let parent = self.path.parent().ok_or_else(|| {
            AtomicTomlError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            ))
        })?;

        let file_name = self.path.file_name().ok_or_else(|| {
            AtomicTomlError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no file name",
            ))
        })?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(parent.join(tmp_name))
    }

    /// Acquires an exclusive file lock, released when the guard drops.
    fn acquire_lock(&self) -> Result<FileLock, AtomicTomlError> {
        FileLock::acquire(&self.path)
    }
}

/// A file lock guard that automatically releases the lock when dropped.
struct FileLock {
    file: File,
}

impl FileLock {
    /// Acquires an exclusive lock on a sibling `.lock` file of `path`.
    fn acquire(path: &Path) -> Result<Self, AtomicTomlError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        use fs2::FileExt;
        file.lock_exclusive()
            .map_err(|e| AtomicTomlError::LockError(format!("Failed to acquire lock: {}", e)))?;

        Ok(FileLock { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        use fs2::FileExt;
        // Closing the handle releases the lock as well; unlocking first keeps
        // the window short on platforms that defer the close.
        let _ = self.file.unlock();
    }
}
