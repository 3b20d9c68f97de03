//! File-based storage implementation.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{KindredError, Result};
use crate::storage::traits::{Storage, StorageConfig, StorageError};

/// A file-based storage implementation.
#[derive(Debug)]
pub struct FileStorage {
    /// The root directory for storage.
    directory: PathBuf,
    /// Storage configuration.
    config: StorageConfig,
}

impl FileStorage {
    /// Create a new file storage in the given directory.
    pub fn new<P: AsRef<Path>>(directory: P, config: StorageConfig) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();

        // Create directory if it doesn't exist
        if !directory.exists() {
            fs::create_dir_all(&directory)
                .map_err(|e| KindredError::storage(format!("Failed to create directory: {e}")))?;
        }

        // Verify it's a directory
        if !directory.is_dir() {
            return Err(KindredError::storage(format!(
                "Path is not a directory: {}",
                directory.display()
            )));
        }

        Ok(FileStorage { directory, config })
    }

    /// Get the root directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Get the full path for a file name.
    fn file_path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    fn sync_directory(&self) -> Result<()> {
        File::open(&self.directory)
            .and_then(|dir| dir.sync_all())
            .map_err(|e| StorageError::IoError(format!("Failed to sync directory: {e}")).into())
    }
}

impl Storage for FileStorage {
    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        fs::read(self.file_path(name)).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::FileNotFound(name.to_string()).into()
            } else {
                StorageError::IoError(e.to_string()).into()
            }
        })
    }

    fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.file_path(name))
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        file.write_all(data)
            .map_err(|e| StorageError::IoError(e.to_string()))?;
        if self.config.sync_writes {
            file.sync_all()
                .map_err(|e| StorageError::IoError(e.to_string()))?;
        }
        Ok(())
    }

    fn file_exists(&self, name: &str) -> bool {
        self.file_path(name).exists()
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        let path = self.file_path(name);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| StorageError::IoError(format!("Failed to delete file: {e}")))?;
        }

        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.directory)
            .map_err(|e| StorageError::IoError(format!("Failed to read directory: {e}")))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::IoError(e.to_string()))?;
            if entry.path().is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    files.push(name.to_string());
                }
            }
        }

        files.sort();
        Ok(files)
    }

    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()> {
        fs::rename(self.file_path(old_name), self.file_path(new_name))
            .map_err(|e| StorageError::IoError(format!("Failed to rename file: {e}")))?;
        if self.config.sync_writes {
            self.sync_directory()?;
        }
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        self.sync_directory()
    }
}
