//! Document indexing: collections, their committed snapshots, bulk ingestion
//! and persistence.

pub mod bulk;
pub mod collection;
pub mod snapshot;
pub mod store;

pub use bulk::{BulkItemResponse, BulkOperation, BulkRequest, BulkResponse};
pub use collection::{Collection, CollectionSettings};
pub use snapshot::{DocKey, IndexSnapshot, WriteBatch, WriteOp};
pub use store::{PersistedCollection, PersistedDocument, SnapshotStore};
