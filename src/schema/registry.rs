//! The set of mappings declared in one collection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{KindredError, Result};
use crate::schema::mapping::Mapping;

/// All mappings of a collection, keyed by document type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingSet {
    mappings: BTreeMap<String, Mapping>,
}

impl MappingSet {
    /// Create an empty mapping set.
    pub fn new() -> Self {
        MappingSet::default()
    }

    /// Declare a mapping, merging it into an existing mapping of the same type.
    ///
    /// Returns `true` when the set changed.
    pub fn declare(&mut self, mapping: Mapping) -> Result<bool> {
        if mapping.doc_type().is_empty() {
            return Err(KindredError::configuration("document type cannot be empty"));
        }

        match self.mappings.get_mut(mapping.doc_type()) {
            Some(existing) => {
                let before = existing.clone();
                existing.merge(&mapping)?;
                Ok(*existing != before)
            }
            None => {
                self.mappings.insert(mapping.doc_type().to_string(), mapping);
                Ok(true)
            }
        }
    }

    /// Get the mapping of a document type.
    pub fn get(&self, doc_type: &str) -> Option<&Mapping> {
        self.mappings.get(doc_type)
    }

    pub(crate) fn get_mut(&mut self, doc_type: &str) -> Option<&mut Mapping> {
        self.mappings.get_mut(doc_type)
    }

    /// Get the mapping of a document type or fail with a not-found error.
    pub fn require(&self, doc_type: &str) -> Result<&Mapping> {
        self.get(doc_type)
            .ok_or_else(|| KindredError::not_found(format!("no mapping for type '{doc_type}'")))
    }

    /// Whether a document type is mapped.
    pub fn contains(&self, doc_type: &str) -> bool {
        self.mappings.contains_key(doc_type)
    }

    /// Get the mapped document types in name order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }

    /// Iterate over all mappings.
    pub fn iter(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.values()
    }

    /// Get the types whose `_parent` is `parent_type`.
    pub fn child_types(&self, parent_type: &str) -> Vec<&str> {
        self.mappings
            .values()
            .filter(|m| m.parent_type() == Some(parent_type))
            .map(Mapping::doc_type)
            .collect()
    }

    /// Whether any mapping declares a nested field at `path`.
    pub fn has_nested_path(&self, path: &str) -> bool {
        self.mappings
            .values()
            .any(|m| m.field(path).and_then(|f| f.as_nested()).is_some())
    }

    /// Get the number of mapped types.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether no type is mapped.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
