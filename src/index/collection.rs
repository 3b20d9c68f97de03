//! A collection: mappings, buffered writes and the committed snapshot.
//!
//! Writes are validated when they are submitted and buffered; nothing a
//! reader sees changes until [`Collection::commit`] swaps in a new snapshot.
//! Commits are serialized. Searches never wait for a commit: they work on the
//! snapshot that was current when they started.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::document::{AnalyzedDocument, Document, DocumentParser};
use crate::error::{KindredError, Result};
use crate::index::bulk::{BulkItemResponse, BulkOperation, BulkRequest, BulkResponse};
use crate::index::snapshot::{DocKey, IndexSnapshot, WriteBatch, WriteOp};
use crate::index::store::{PersistedCollection, SnapshotStore};
use crate::schema::{Dynamic, Mapping, MappingSet};
use crate::search::{SearchRequest, SearchResponse, Searcher};

/// Settings a collection inherits from its engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectionSettings {
    /// Dynamic policy for mappings that do not set one. Under
    /// [`Dynamic::True`] writes to an unmapped type create its mapping.
    pub default_dynamic: Dynamic,
    /// Candidate count from which searches evaluate documents in parallel.
    pub parallel_threshold: usize,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        CollectionSettings {
            default_dynamic: Dynamic::True,
            parallel_threshold: 1024,
        }
    }
}

/// A named set of typed documents.
#[derive(Debug)]
pub struct Collection {
    name: String,
    settings: CollectionSettings,
    mappings: RwLock<MappingSet>,
    pending: Mutex<Vec<WriteBatch>>,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    commit_lock: Mutex<()>,
    seq_no: AtomicU64,
    store: Option<SnapshotStore>,
}

impl Collection {
    /// Create an empty collection.
    ///
    /// With a store, every commit and mapping change is written to it.
    pub fn new<S: Into<String>>(
        name: S,
        settings: CollectionSettings,
        store: Option<SnapshotStore>,
    ) -> Self {
        Collection {
            name: name.into(),
            settings,
            mappings: RwLock::new(MappingSet::new()),
            pending: Mutex::new(Vec::new()),
            snapshot: RwLock::new(Arc::new(IndexSnapshot::empty())),
            commit_lock: Mutex::new(()),
            seq_no: AtomicU64::new(0),
            store,
        }
    }

    /// Rebuild a collection from its persisted state.
    pub fn restore<S: Into<String>>(
        name: S,
        settings: CollectionSettings,
        store: Option<SnapshotStore>,
        persisted: PersistedCollection,
    ) -> Result<Self> {
        let name = name.into();
        let mut batch = WriteBatch::with_capacity(persisted.documents.len());

        for doc in persisted.documents {
            let mapping = persisted.mappings.get(&doc.doc_type).ok_or_else(|| {
                KindredError::storage(format!(
                    "collection '{name}' holds documents of unmapped type '{}'",
                    doc.doc_type
                ))
            })?;
            let parsed = DocumentParser::new(mapping, settings.default_dynamic)
                .parse(&doc.source)
                .map_err(|e| {
                    KindredError::storage(format!(
                        "collection '{name}' holds an invalid document '{}': {e}",
                        doc.id
                    ))
                })?;
            batch.push(WriteOp::Index(Arc::new(AnalyzedDocument {
                id: doc.id,
                doc_type: doc.doc_type,
                parent: doc.parent,
                source: Arc::new(doc.source),
                fields: parsed.fields,
                seq_no: doc.seq_no,
            })));
        }

        let snapshot = IndexSnapshot::empty()
            .apply([&batch], Arc::new(persisted.mappings.clone()))
            .with_generation(persisted.generation);
        let max_seq_no = snapshot.max_seq_no();

        info!(
            "Restored collection '{}' with {} documents at generation {}",
            name,
            snapshot.len(),
            snapshot.generation()
        );

        Ok(Collection {
            name,
            settings,
            mappings: RwLock::new(persisted.mappings),
            pending: Mutex::new(Vec::new()),
            snapshot: RwLock::new(Arc::new(snapshot)),
            commit_lock: Mutex::new(()),
            seq_no: AtomicU64::new(max_seq_no),
            store,
        })
    }

    /// Get the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the collection settings.
    pub fn settings(&self) -> &CollectionSettings {
        &self.settings
    }

    /// Declare or extend the mapping of a document type.
    ///
    /// Redeclaring an identical mapping does nothing. Changing the kind of an
    /// existing field or the parent type fails with a configuration error.
    pub fn declare_mapping(&self, mapping: Mapping) -> Result<()> {
        let _guard = self.commit_lock.lock();
        let doc_type = mapping.doc_type().to_string();

        let changed = self.mappings.write().declare(mapping)?;
        if !changed {
            debug!("Mapping of '{}/{}' unchanged", self.name, doc_type);
            return Ok(());
        }

        info!("Declared mapping '{}/{}'", self.name, doc_type);
        self.persist()
    }

    /// Write the committed snapshot and the current mappings to the store.
    pub(crate) fn persist(&self) -> Result<()> {
        if let Some(store) = &self.store {
            let mappings = self.mappings.read().clone();
            store.save(&self.name, &self.snapshot(), &mappings)?;
        }
        Ok(())
    }

    /// Get the mapping of a document type.
    pub fn mapping(&self, doc_type: &str) -> Option<Mapping> {
        self.mappings.read().get(doc_type).cloned()
    }

    /// Get a copy of all mappings.
    pub fn mappings(&self) -> MappingSet {
        self.mappings.read().clone()
    }

    /// Get the mapping a write of `doc_type` validates against, creating an
    /// empty one when the collection is dynamic.
    fn mapping_for_write(&self, doc_type: &str) -> Result<Mapping> {
        if let Some(mapping) = self.mappings.read().get(doc_type) {
            return Ok(mapping.clone());
        }

        if self.settings.default_dynamic != Dynamic::True {
            return Err(KindredError::not_found(format!(
                "no mapping for type '{}' in collection '{}'",
                doc_type, self.name
            )));
        }

        let mut mappings = self.mappings.write();
        if !mappings.contains(doc_type) {
            mappings.declare(Mapping::new(doc_type))?;
            info!("Created dynamic mapping '{}/{}'", self.name, doc_type);
        }
        mappings.require(doc_type).cloned()
    }

    /// Validate and analyze a write without buffering it.
    fn prepare_index(
        &self,
        doc_type: &str,
        id: Option<&str>,
        parent: Option<&str>,
        source: Document,
    ) -> Result<WriteOp> {
        if id.is_some_and(str::is_empty) {
            return Err(KindredError::validation("document id cannot be empty"));
        }

        let mapping = self.mapping_for_write(doc_type)?;
        match (mapping.parent_type(), parent) {
            (Some(parent_type), None) => {
                return Err(KindredError::validation(format!(
                    "type '{doc_type}' has a _parent of type '{parent_type}' and requires a parent id"
                )));
            }
            (Some(_), Some("")) => {
                return Err(KindredError::validation("parent id cannot be empty"));
            }
            (None, Some(_)) => {
                return Err(KindredError::validation(format!(
                    "type '{doc_type}' has no _parent mapping and cannot take a parent id"
                )));
            }
            _ => {}
        }

        let parsed = DocumentParser::new(&mapping, self.settings.default_dynamic).parse(&source)?;

        if parsed.has_mapping_update() {
            let mut mappings = self.mappings.write();
            let live = mappings
                .get_mut(doc_type)
                .ok_or_else(|| KindredError::not_found(format!("no mapping for type '{doc_type}'")))?;
            let mut root = live.root().clone();
            root.merge(&parsed.mapping_update, "")
                .map_err(|e| KindredError::validation(e.to_string()))?;
            *live.root_mut() = root;
            debug!("Dynamic mapping update for '{}/{}'", self.name, doc_type);
        }

        let id = match id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        Ok(WriteOp::Index(Arc::new(AnalyzedDocument {
            id,
            doc_type: doc_type.to_string(),
            parent: parent.map(str::to_string),
            source: Arc::new(source),
            fields: parsed.fields,
            seq_no: self.seq_no.fetch_add(1, Ordering::SeqCst) + 1,
        })))
    }

    fn prepare_delete(&self, doc_type: &str, id: &str) -> Result<WriteOp> {
        if id.is_empty() {
            return Err(KindredError::validation("document id cannot be empty"));
        }
        if !self.mappings.read().contains(doc_type) {
            return Err(KindredError::not_found(format!(
                "no mapping for type '{}' in collection '{}'",
                doc_type, self.name
            )));
        }
        Ok(WriteOp::Delete(DocKey::new(doc_type, id)))
    }

    /// Buffer a document write; returns the document id, generated when
    /// `id` is `None`.
    pub fn index(
        &self,
        doc_type: &str,
        id: Option<&str>,
        parent: Option<&str>,
        source: Document,
    ) -> Result<String> {
        let op = self.prepare_index(doc_type, id, parent, source)?;
        let id = op.key().id;
        self.pending.lock().push(vec![op]);
        Ok(id)
    }

    /// Buffer a top-level document with a known id.
    pub fn put(&self, doc_type: &str, id: &str, source: Document) -> Result<()> {
        self.index(doc_type, Some(id), None, source).map(|_| ())
    }

    /// Buffer a delete.
    pub fn delete(&self, doc_type: &str, id: &str) -> Result<()> {
        let op = self.prepare_delete(doc_type, id)?;
        self.pending.lock().push(vec![op]);
        Ok(())
    }

    /// Validate every operation of a bulk request and buffer the valid ones
    /// as one batch.
    pub fn bulk(&self, request: BulkRequest) -> BulkResponse {
        let start = Instant::now();
        let mut batch = WriteBatch::with_capacity(request.len());
        let mut items = Vec::with_capacity(request.len());

        for (position, operation) in request.into_operations().into_iter().enumerate() {
            let action = operation.action();
            let doc_type = operation.doc_type().to_string();
            let requested_id = match &operation {
                BulkOperation::Index { id, .. } | BulkOperation::Invalid { id, .. } => id.clone(),
                BulkOperation::Delete { id, .. } => Some(id.clone()),
            };

            let prepared = match operation {
                BulkOperation::Index {
                    doc_type,
                    id,
                    parent,
                    source,
                } => self.prepare_index(&doc_type, id.as_deref(), parent.as_deref(), source),
                BulkOperation::Delete { doc_type, id } => self.prepare_delete(&doc_type, &id),
                BulkOperation::Invalid { reason, .. } => Err(KindredError::validation(reason)),
            };

            let (id, error) = match prepared {
                Ok(op) => {
                    let id = op.key().id;
                    batch.push(op);
                    (Some(id), None)
                }
                Err(e) => (requested_id, Some(e)),
            };
            items.push(BulkItemResponse {
                position,
                action,
                doc_type,
                id,
                error,
            });
        }

        let accepted = batch.len();
        if !batch.is_empty() {
            self.pending.lock().push(batch);
        }

        let response = BulkResponse {
            items,
            took: start.elapsed(),
        };
        if response.has_failures() {
            warn!(
                "Bulk request on '{}' rejected {} of {} operations: {}",
                self.name,
                response.items.len() - accepted,
                response.items.len(),
                response.failure_message()
            );
        } else {
            debug!("Bulk request on '{}' buffered {} operations", self.name, accepted);
        }
        response
    }

    /// Apply every buffered write to a new snapshot and make it visible.
    ///
    /// Blocks until the writes buffered before the call are visible and, with
    /// a store, durable. Returns the generation of the current snapshot; a
    /// commit with nothing buffered leaves it unchanged.
    pub fn commit(&self) -> Result<u64> {
        let _guard = self.commit_lock.lock();
        let batches = std::mem::take(&mut *self.pending.lock());
        let current = self.snapshot();

        if batches.is_empty() {
            debug!(
                "Nothing to commit in '{}' (generation {})",
                self.name,
                current.generation()
            );
            return Ok(current.generation());
        }

        let start = Instant::now();
        let mappings = Arc::new(self.mappings.read().clone());
        let next = current.apply(&batches, Arc::clone(&mappings));

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.name, &next, &mappings) {
                // Requeue ahead of writes buffered in the meantime.
                let mut pending = self.pending.lock();
                let newer = std::mem::take(&mut *pending);
                *pending = batches;
                pending.extend(newer);
                warn!("Commit of '{}' failed: {}", self.name, e);
                return Err(e);
            }
        }

        let generation = next.generation();
        let documents = next.len();
        *self.snapshot.write() = Arc::new(next);

        info!(
            "Committed '{}' generation {} ({} documents) in {:?}",
            self.name,
            generation,
            documents,
            start.elapsed()
        );
        Ok(generation)
    }

    /// Alias of [`Collection::commit`].
    pub fn refresh(&self) -> Result<u64> {
        self.commit()
    }

    /// Get the current committed snapshot.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot.read().clone()
    }

    /// Get a committed document.
    pub fn get(&self, doc_type: &str, id: &str) -> Option<Arc<AnalyzedDocument>> {
        self.snapshot().get(doc_type, id).cloned()
    }

    /// Count the committed documents.
    pub fn doc_count(&self) -> usize {
        self.snapshot().len()
    }

    /// Count the buffered, not yet committed, writes.
    pub fn pending_writes(&self) -> usize {
        self.pending.lock().iter().map(Vec::len).sum()
    }

    /// Search the committed snapshot.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        request.validate(&self.mappings.read())?;
        Searcher::new(self.snapshot())
            .with_parallel_threshold(self.settings.parallel_threshold)
            .search(request)
    }
}
