//! The engine: a registry of collections.
//!
//! An [`Engine`] owns named [`Collection`]s and, when it has storage, reloads
//! them when it is opened again. Most methods take the collection name and
//! forward to the collection.
//!
//! ```
//! use kindred::document::Document;
//! use kindred::engine::{Engine, EngineConfig};
//! use kindred::query::TermQuery;
//! use kindred::schema::Mapping;
//! use kindred::search::SearchRequest;
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! engine
//!     .declare_mapping("social", Mapping::builder("profile").keyword("name").build().unwrap())
//!     .unwrap();
//! engine
//!     .put("social", "profile", "1", Document::builder().add_text("name", "Frederic").build())
//!     .unwrap();
//! engine.commit("social").unwrap();
//!
//! let request = SearchRequest::new(Box::new(TermQuery::new("name", "Frederic")));
//! assert_eq!(engine.search("social", &request).unwrap().total_hits, 1);
//! ```

pub mod config;
pub mod health;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::document::{AnalyzedDocument, Document};
use crate::error::{KindredError, Result};
use crate::index::{BulkRequest, BulkResponse, Collection, SnapshotStore};
use crate::query::QueryParser;
use crate::relation::{NestedStore, ParentChildStore};
use crate::schema::Mapping;
use crate::search::{SearchRequest, SearchResponse};
use crate::storage::{FileStorage, Storage, StorageConfig};

pub use self::config::{EngineConfig, EngineConfigBuilder};
pub use self::health::{CollectionHealth, HealthReport, HealthStatus};

/// A registry of collections sharing one configuration and storage.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    storage: Option<Arc<dyn Storage>>,
    collections: RwLock<AHashMap<String, Arc<Collection>>>,
    parser: QueryParser,
    started_at: DateTime<Utc>,
}

impl Engine {
    /// Open an engine.
    ///
    /// With `data_dir` set, collections persisted there are loaded.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let storage = match &config.data_dir {
            Some(dir) => {
                let storage = FileStorage::new(
                    dir,
                    StorageConfig {
                        sync_writes: config.sync_writes,
                    },
                )?;
                Some(Arc::new(storage) as Arc<dyn Storage>)
            }
            None => None,
        };
        Self::open(config, storage)
    }

    /// Open an engine over an explicit storage backend, ignoring `data_dir`.
    pub fn with_storage(config: EngineConfig, storage: Arc<dyn Storage>) -> Result<Self> {
        config.validate()?;
        Self::open(config, Some(storage))
    }

    fn open(config: EngineConfig, storage: Option<Arc<dyn Storage>>) -> Result<Self> {
        let mut collections = AHashMap::new();

        if let Some(storage) = &storage {
            let store = SnapshotStore::new(Arc::clone(storage));
            for name in store.collection_names()? {
                let persisted = store.load(&name)?.ok_or_else(|| {
                    KindredError::storage(format!("collection '{name}' vanished while loading"))
                })?;
                let collection = Collection::restore(
                    name.as_str(),
                    config.collection_settings(),
                    Some(store.clone()),
                    persisted,
                )?;
                collections.insert(name, Arc::new(collection));
            }
        }

        info!(
            "Engine opened with {} collections ({})",
            collections.len(),
            if storage.is_some() { "persistent" } else { "in memory" }
        );

        Ok(Engine {
            parser: QueryParser::new().with_default_fuzziness(config.default_fuzziness),
            config,
            storage,
            collections: RwLock::new(collections),
            started_at: Utc::now(),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get a query parser configured like the engine.
    pub fn query_parser(&self) -> &QueryParser {
        &self.parser
    }

    fn store(&self) -> Option<SnapshotStore> {
        self.storage.as_ref().map(|s| SnapshotStore::new(Arc::clone(s)))
    }

    fn check_name(name: &str) -> Result<()> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(())
        } else {
            Err(KindredError::configuration(format!(
                "invalid collection name '{name}': use ASCII letters, digits, '-' and '_'"
            )))
        }
    }

    /// Create an empty collection.
    pub fn create_collection(&self, name: &str) -> Result<Arc<Collection>> {
        Self::check_name(name)?;

        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(KindredError::configuration(format!(
                "collection '{name}' already exists"
            )));
        }

        let collection = Arc::new(Collection::new(
            name,
            self.config.collection_settings(),
            self.store(),
        ));
        collection.persist()?;
        collections.insert(name.to_string(), Arc::clone(&collection));

        info!("Created collection '{name}'");
        Ok(collection)
    }

    /// Get a collection, creating it when missing.
    pub fn get_or_create_collection(&self, name: &str) -> Result<Arc<Collection>> {
        if let Some(collection) = self.collections.read().get(name) {
            return Ok(Arc::clone(collection));
        }
        match self.create_collection(name) {
            Ok(collection) => Ok(collection),
            // Lost a race with another creator.
            Err(KindredError::Configuration(_)) if self.collections.read().contains_key(name) => {
                self.collection(name)
            }
            Err(e) => Err(e),
        }
    }

    /// Get a collection.
    pub fn collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.collections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| KindredError::not_found(format!("collection '{name}'")))
    }

    /// Remove a collection and its persisted state.
    pub fn drop_collection(&self, name: &str) -> Result<()> {
        let removed = self.collections.write().remove(name);
        if removed.is_none() {
            return Err(KindredError::not_found(format!("collection '{name}'")));
        }
        if let Some(store) = self.store() {
            store.remove(name)?;
        }
        info!("Dropped collection '{name}'");
        Ok(())
    }

    /// Get the collection names in order.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Declare a mapping, creating the collection if needed.
    pub fn declare_mapping(&self, collection: &str, mapping: Mapping) -> Result<()> {
        self.get_or_create_collection(collection)?
            .declare_mapping(mapping)
    }

    /// Buffer a top-level document.
    pub fn put(&self, collection: &str, doc_type: &str, id: &str, source: Document) -> Result<()> {
        self.collection(collection)?.put(doc_type, id, source)
    }

    /// Buffer a document with an optional id and parent; returns the id.
    pub fn index(
        &self,
        collection: &str,
        doc_type: &str,
        id: Option<&str>,
        parent: Option<&str>,
        source: Document,
    ) -> Result<String> {
        self.collection(collection)?
            .index(doc_type, id, parent, source)
    }

    /// Buffer a delete.
    pub fn delete(&self, collection: &str, doc_type: &str, id: &str) -> Result<()> {
        self.collection(collection)?.delete(doc_type, id)
    }

    /// Get a committed document.
    pub fn get(
        &self,
        collection: &str,
        doc_type: &str,
        id: &str,
    ) -> Result<Option<Arc<AnalyzedDocument>>> {
        Ok(self.collection(collection)?.get(doc_type, id))
    }

    /// Buffer a bulk request.
    pub fn bulk(&self, collection: &str, request: BulkRequest) -> Result<BulkResponse> {
        Ok(self.collection(collection)?.bulk(request))
    }

    /// Commit one collection; returns its generation.
    pub fn commit(&self, collection: &str) -> Result<u64> {
        self.collection(collection)?.commit()
    }

    /// Alias of [`Engine::commit`].
    pub fn refresh(&self, collection: &str) -> Result<u64> {
        self.commit(collection)
    }

    /// Commit every collection.
    pub fn refresh_all(&self) -> Result<()> {
        let collections: Vec<Arc<Collection>> =
            self.collections.read().values().cloned().collect();
        for collection in collections {
            collection.commit()?;
        }
        Ok(())
    }

    /// Search the committed documents of a collection.
    pub fn search(&self, collection: &str, request: &SearchRequest) -> Result<SearchResponse> {
        self.collection(collection)?.search(request)
    }

    /// Count the committed documents of a collection.
    pub fn doc_count(&self, collection: &str) -> Result<usize> {
        Ok(self.collection(collection)?.doc_count())
    }

    /// Get a nested-document store over a type of a collection.
    pub fn nested_store(&self, collection: &str, doc_type: &str) -> Result<NestedStore> {
        Ok(NestedStore::new(self.collection(collection)?, doc_type))
    }

    /// Get a parent/child store over two types of a collection.
    pub fn parent_child_store(
        &self,
        collection: &str,
        parent_type: &str,
        child_type: &str,
    ) -> Result<ParentChildStore> {
        ParentChildStore::new(self.collection(collection)?, parent_type, child_type)
    }

    /// Take a health report.
    pub fn health(&self) -> HealthReport {
        let storage_error = self
            .storage
            .as_ref()
            .and_then(|storage| storage.list_files().err())
            .map(|e| e.to_string());

        let mut collections: Vec<CollectionHealth> = self
            .collections
            .read()
            .values()
            .map(|collection| {
                let snapshot = collection.snapshot();
                CollectionHealth {
                    name: collection.name().to_string(),
                    types: collection.mappings().types().map(str::to_string).collect(),
                    documents: snapshot.len(),
                    pending_writes: collection.pending_writes(),
                    generation: snapshot.generation(),
                }
            })
            .collect();
        collections.sort_by(|a, b| a.name.cmp(&b.name));

        let status = if storage_error.is_some() {
            HealthStatus::Red
        } else if collections.iter().any(|c| c.pending_writes > 0) {
            HealthStatus::Yellow
        } else {
            HealthStatus::Green
        };

        HealthReport {
            status,
            collections,
            storage_error,
            started_at: self.started_at,
            checked_at: Utc::now(),
        }
    }

    /// Wait until the engine is ready, polling its health.
    pub fn wait_for_ready(&self, timeout: Duration) -> Result<HealthReport> {
        let start = Instant::now();
        loop {
            let report = self.health();
            if report.is_ready() {
                debug!("Engine ready with status {}", report.status);
                return Ok(report);
            }
            if start.elapsed() >= timeout {
                warn!("Engine not ready after {timeout:?}: {:?}", report.storage_error);
                return Err(KindredError::other(format!(
                    "engine not ready after {timeout:?}: {}",
                    report.storage_error.unwrap_or_default()
                )));
            }
            thread::sleep(Duration::from_millis(50));
        }
    }
}
