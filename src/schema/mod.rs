//! Mapping declarations for document types.
//!
//! A [`Mapping`] fixes, per document type, the kind of every field (exact-match
//! keyword, analyzed text, numeric, boolean or nested object), the optional
//! parent type of a parent/child relationship and the policy for fields the
//! mapping does not mention.

pub mod field;
pub mod mapping;
pub mod registry;

// Re-export commonly used types
pub use field::{Dynamic, FieldMapping, ObjectMapping};
pub use mapping::{Mapping, MappingBuilder};
pub use registry::MappingSet;
