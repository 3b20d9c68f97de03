//! Durable copies of committed collections.
//!
//! Each collection is one file, `<name>.snapshot`, holding a CRC32 line
//! followed by the JSON body. A save writes `<name>.snapshot.tmp` and renames
//! it over the previous file, so a crash leaves either the old or the new
//! commit on disk.

use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Result;
use crate::index::snapshot::IndexSnapshot;
use crate::schema::MappingSet;
use crate::storage::{Storage, StorageError};

const EXTENSION: &str = ".snapshot";
const TEMP_SUFFIX: &str = ".tmp";

/// A document as written to storage: its source, not its terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedDocument {
    /// Document type tag.
    pub doc_type: String,
    /// Document identifier.
    pub id: String,
    /// Parent identifier, for child documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Write sequence number.
    pub seq_no: u64,
    /// Original source.
    pub source: Document,
}

/// The committed state of one collection as written to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedCollection {
    /// Commit generation.
    pub generation: u64,
    /// Declared mappings.
    pub mappings: MappingSet,
    /// Committed documents in write order.
    pub documents: Vec<PersistedDocument>,
}

/// Reads and writes collection files on a [`Storage`].
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    storage: Arc<dyn Storage>,
}

impl SnapshotStore {
    /// Create a store on top of a storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        SnapshotStore { storage }
    }

    fn file_name(collection: &str) -> String {
        format!("{collection}{EXTENSION}")
    }

    /// Write the committed state of a collection and sync it.
    pub fn save(&self, collection: &str, snapshot: &IndexSnapshot, mappings: &MappingSet) -> Result<()> {
        let documents = snapshot
            .documents_of(&[])
            .into_iter()
            .map(|doc| PersistedDocument {
                doc_type: doc.doc_type.clone(),
                id: doc.id.clone(),
                parent: doc.parent.clone(),
                seq_no: doc.seq_no,
                source: doc.source.as_ref().clone(),
            })
            .collect();
        let persisted = PersistedCollection {
            generation: snapshot.generation(),
            mappings: mappings.clone(),
            documents,
        };

        let body = serde_json::to_vec(&persisted)?;
        let checksum = crc32fast::hash(&body);
        let mut data = format!("{checksum:08x}\n").into_bytes();
        data.extend_from_slice(&body);

        let name = Self::file_name(collection);
        let temp = format!("{name}{TEMP_SUFFIX}");
        self.storage.write_file(&temp, &data)?;
        self.storage.rename_file(&temp, &name)?;
        self.storage.sync()?;

        debug!(
            "Saved collection '{}' at generation {} ({} bytes)",
            collection,
            persisted.generation,
            data.len()
        );
        Ok(())
    }

    /// Read the committed state of a collection, if it was ever saved.
    pub fn load(&self, collection: &str) -> Result<Option<PersistedCollection>> {
        let name = Self::file_name(collection);
        if !self.storage.file_exists(&name) {
            return Ok(None);
        }

        let data = self.storage.read_file(&name)?;
        let split = data
            .iter()
            .position(|b| *b == b'\n')
            .ok_or_else(|| StorageError::Corrupted(name.clone()))?;
        let (header, body) = (&data[..split], &data[split + 1..]);

        let expected = std::str::from_utf8(header)
            .ok()
            .and_then(|h| u32::from_str_radix(h.trim(), 16).ok())
            .ok_or_else(|| StorageError::Corrupted(name.clone()))?;
        let actual = crc32fast::hash(body);
        if actual != expected {
            warn!("Checksum mismatch in {name}: expected {expected:08x}, found {actual:08x}");
            return Err(StorageError::Corrupted(name).into());
        }

        Ok(Some(serde_json::from_slice(body)?))
    }

    /// Delete the file of a collection.
    pub fn remove(&self, collection: &str) -> Result<()> {
        self.storage.delete_file(&Self::file_name(collection))
    }

    /// List the collections that have a file in storage.
    pub fn collection_names(&self) -> Result<Vec<String>> {
        Ok(self
            .storage
            .list_files()?
            .into_iter()
            .filter_map(|file| file.strip_suffix(EXTENSION).map(str::to_string))
            .collect())
    }
}
