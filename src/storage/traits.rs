//! Storage abstraction trait and common types.

use std::fmt;

use crate::error::{KindredError, Result};

/// A trait for storage backends that hold named byte files.
///
/// This provides a pluggable interface for different storage implementations
/// like file system or memory. Files are written whole; a writer that needs an
/// atomic replacement writes a temporary name and renames it.
pub trait Storage: Send + Sync + fmt::Debug {
    /// Read a whole file.
    fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    /// Create or truncate a file and write its content.
    fn write_file(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Delete a file. Deleting a missing file is not an error.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// List all files in the storage.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Rename a file, replacing any file with the new name.
    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Sync all pending writes to storage.
    fn sync(&self) -> Result<()>;
}

/// Configuration for storage backends.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Whether to sync every write to the device before returning.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig { sync_writes: true }
    }
}

/// Error types specific to storage operations.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// File not found.
    FileNotFound(String),

    /// I/O error.
    IoError(String),

    /// The content of a file failed its integrity check.
    Corrupted(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::FileNotFound(name) => write!(f, "File not found: {name}"),
            StorageError::IoError(msg) => write!(f, "I/O error: {msg}"),
            StorageError::Corrupted(name) => write!(f, "Corrupted file: {name}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for KindredError {
    fn from(err: StorageError) -> Self {
        KindredError::storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert!(config.sync_writes);
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::FileNotFound("profiles.snapshot".to_string());
        assert_eq!(err.to_string(), "File not found: profiles.snapshot");

        let err = StorageError::Corrupted("profiles.snapshot".to_string());
        let err: KindredError = err.into();
        assert_eq!(
            err.to_string(),
            "Storage error: Corrupted file: profiles.snapshot"
        );
    }
}
