//! Immutable committed views of a collection.
//!
//! A commit never mutates the snapshot readers hold. It builds the next
//! snapshot from the current one plus the drained write batches and swaps it
//! in; searches that started earlier keep their `Arc` to the old one.

use std::collections::BTreeSet;
use std::sync::Arc;

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::AnalyzedDocument;
use crate::schema::MappingSet;

/// Identifies a document within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocKey {
    /// Document type tag.
    pub doc_type: String,
    /// Document identifier.
    pub id: String,
}

impl DocKey {
    /// Create a new document key.
    pub fn new<T: Into<String>, I: Into<String>>(doc_type: T, id: I) -> Self {
        DocKey {
            doc_type: doc_type.into(),
            id: id.into(),
        }
    }
}

/// A buffered write.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Add or replace a document.
    Index(Arc<AnalyzedDocument>),
    /// Remove a document; removing a missing document is a no-op.
    Delete(DocKey),
}

impl WriteOp {
    /// Get the key of the document this write touches.
    pub fn key(&self) -> DocKey {
        match self {
            WriteOp::Index(doc) => DocKey::new(doc.doc_type.as_str(), doc.id.as_str()),
            WriteOp::Delete(key) => key.clone(),
        }
    }
}

/// Writes that become visible together.
pub type WriteBatch = Vec<WriteOp>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct JoinKey {
    child_type: String,
    parent_id: String,
}

/// A committed, immutable view of one collection.
#[derive(Debug, Clone, Default)]
pub struct IndexSnapshot {
    generation: u64,
    mappings: Arc<MappingSet>,
    documents: AHashMap<DocKey, Arc<AnalyzedDocument>>,
    children: AHashMap<JoinKey, BTreeSet<String>>,
    committed_at: Option<DateTime<Utc>>,
}

impl IndexSnapshot {
    /// Create an empty snapshot at generation zero.
    pub fn empty() -> Self {
        IndexSnapshot::default()
    }

    /// Build the next snapshot by applying write batches in order.
    ///
    /// `mappings` are the mappings the written documents were analyzed with.
    pub fn apply<'a, I>(&self, batches: I, mappings: Arc<MappingSet>) -> IndexSnapshot
    where
        I: IntoIterator<Item = &'a WriteBatch>,
    {
        let mut next = IndexSnapshot {
            generation: self.generation + 1,
            mappings,
            documents: self.documents.clone(),
            children: self.children.clone(),
            committed_at: Some(Utc::now()),
        };

        for op in batches.into_iter().flatten() {
            match op {
                WriteOp::Index(doc) => next.insert(Arc::clone(doc)),
                WriteOp::Delete(key) => {
                    next.remove(key);
                }
            }
        }

        next
    }

    fn insert(&mut self, doc: Arc<AnalyzedDocument>) {
        let key = DocKey::new(doc.doc_type.as_str(), doc.id.as_str());
        self.remove(&key);

        if let Some(parent_id) = &doc.parent {
            self.children
                .entry(JoinKey {
                    child_type: doc.doc_type.clone(),
                    parent_id: parent_id.clone(),
                })
                .or_default()
                .insert(doc.id.clone());
        }
        self.documents.insert(key, doc);
    }

    fn remove(&mut self, key: &DocKey) -> Option<Arc<AnalyzedDocument>> {
        let removed = self.documents.remove(key)?;

        if let Some(parent_id) = &removed.parent {
            let join = JoinKey {
                child_type: removed.doc_type.clone(),
                parent_id: parent_id.clone(),
            };
            if let Some(ids) = self.children.get_mut(&join) {
                ids.remove(&removed.id);
                if ids.is_empty() {
                    self.children.remove(&join);
                }
            }
        }

        Some(removed)
    }

    /// Get the commit generation; every non-empty commit increments it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Get the time of the commit that produced this snapshot.
    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        self.committed_at
    }

    /// Get the mappings the documents of this snapshot were analyzed with.
    pub fn mappings(&self) -> &MappingSet {
        &self.mappings
    }

    /// Get a committed document.
    pub fn get(&self, doc_type: &str, id: &str) -> Option<&Arc<AnalyzedDocument>> {
        self.documents.get(&DocKey::new(doc_type, id))
    }

    /// Get the committed children of type `child_type` that reference `parent_id`.
    pub fn children<'a>(
        &'a self,
        child_type: &'a str,
        parent_id: &str,
    ) -> impl Iterator<Item = &'a Arc<AnalyzedDocument>> + 'a {
        let join = JoinKey {
            child_type: child_type.to_string(),
            parent_id: parent_id.to_string(),
        };
        self.children
            .get(&join)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.documents.get(&DocKey::new(child_type, id.as_str())))
    }

    /// Get the documents of the given types in write order.
    ///
    /// An empty type list selects every document.
    pub fn documents_of(&self, doc_types: &[String]) -> Vec<&Arc<AnalyzedDocument>> {
        let mut docs: Vec<_> = self
            .documents
            .values()
            .filter(|doc| doc_types.is_empty() || doc_types.contains(&doc.doc_type))
            .collect();
        docs.sort_by_key(|doc| doc.seq_no);
        docs
    }

    /// Iterate over all documents in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<AnalyzedDocument>> {
        self.documents.values()
    }

    /// Count the documents of one type, or of every type.
    pub fn count(&self, doc_type: Option<&str>) -> usize {
        match doc_type {
            None => self.documents.len(),
            Some(t) => self.documents.keys().filter(|k| k.doc_type == t).count(),
        }
    }

    /// Get the total number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the snapshot holds no document.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Get the highest sequence number in the snapshot.
    pub fn max_seq_no(&self) -> u64 {
        self.documents.values().map(|d| d.seq_no).max().unwrap_or(0)
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }
}
