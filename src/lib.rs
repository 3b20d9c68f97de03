//! # Kindred
//!
//! An embeddable document engine for relationship queries.
//!
//! Documents are grouped in collections and tagged with a type. A type's
//! mapping decides how its fields are indexed:
//!
//! - `keyword` fields match whole values and `text` fields match lowercased words
//! - `nested` fields hold arrays of objects that are matched one object at a time
//! - a `_parent` type links child documents to a parent document by id
//!
//! Writes are buffered and become visible together when the collection is
//! committed. Searches read one committed snapshot and can combine term,
//! fuzzy, boolean, nested, `has_child` and `has_parent` queries.

pub mod analysis;
pub mod cli;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod query;
pub mod relation;
pub mod schema;
pub mod search;
pub mod storage;
pub mod util;

pub mod prelude {
    pub use crate::document::{Document, FieldValue};
    pub use crate::engine::{Engine, EngineConfig};
    pub use crate::error::{KindredError, Result};
    pub use crate::index::{BulkRequest, Collection};
    pub use crate::query::{
        BooleanQuery, FuzzyQuery, HasChildQuery, HasParentQuery, MatchAllQuery, NestedQuery,
        Query, TermQuery,
    };
    pub use crate::relation::{NestedStore, ParentChildStore};
    pub use crate::schema::{Mapping, ObjectMapping};
    pub use crate::search::{SearchRequest, SearchResponse};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
