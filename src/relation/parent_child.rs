//! Parent and child documents joined by the parent identifier.

use std::sync::Arc;

use log::debug;

use crate::document::{AnalyzedDocument, Document};
use crate::error::{KindredError, Result};
use crate::index::Collection;
use crate::query::{HasChildQuery, Query};
use crate::search::{SearchRequest, SearchResponse};

/// Indexes and queries one parent type and one of its child types.
///
/// The child type's mapping must declare the parent type as its `_parent`.
/// Children reference their parent; they are not owned by it. Deleting a
/// parent leaves its children in place unless the delete cascades.
#[derive(Debug, Clone)]
pub struct ParentChildStore {
    collection: Arc<Collection>,
    parent_type: String,
    child_type: String,
}

impl ParentChildStore {
    /// Create a store over a parent type and a child type.
    pub fn new<P: Into<String>, C: Into<String>>(
        collection: Arc<Collection>,
        parent_type: P,
        child_type: C,
    ) -> Result<Self> {
        let parent_type = parent_type.into();
        let child_type = child_type.into();

        let declared = collection
            .mapping(&child_type)
            .ok_or_else(|| KindredError::not_found(format!("no mapping for type '{child_type}'")))?
            .parent_type()
            .map(str::to_string);
        if declared.as_deref() != Some(parent_type.as_str()) {
            return Err(KindredError::configuration(format!(
                "type '{child_type}' does not declare '{parent_type}' as its _parent"
            )));
        }

        Ok(ParentChildStore {
            collection,
            parent_type,
            child_type,
        })
    }

    /// Get the underlying collection.
    pub fn collection(&self) -> &Arc<Collection> {
        &self.collection
    }

    /// Get the parent type.
    pub fn parent_type(&self) -> &str {
        &self.parent_type
    }

    /// Get the child type.
    pub fn child_type(&self) -> &str {
        &self.child_type
    }

    /// Buffer a parent document.
    pub fn index_parent(&self, parent_id: &str, fields: Document) -> Result<()> {
        self.collection.put(&self.parent_type, parent_id, fields)
    }

    /// Buffer a child document under a generated id; returns the id.
    ///
    /// The parent does not have to exist.
    pub fn index_child(&self, child_fields: Document, parent_id: &str) -> Result<String> {
        self.collection
            .index(&self.child_type, None, Some(parent_id), child_fields)
    }

    /// Buffer a child document with a known id.
    pub fn index_child_with_id(
        &self,
        child_id: &str,
        child_fields: Document,
        parent_id: &str,
    ) -> Result<()> {
        self.collection
            .index(&self.child_type, Some(child_id), Some(parent_id), child_fields)
            .map(|_| ())
    }

    /// Find the parents matching `parent_predicate` that have at least one
    /// committed child matching `child_predicate`.
    ///
    /// Every match is returned.
    pub fn query_by_has_child(
        &self,
        parent_predicate: Box<dyn Query>,
        child_predicate: Box<dyn Query>,
    ) -> Result<SearchResponse> {
        let request = SearchRequest::new(parent_predicate)
            .with_type(self.parent_type.as_str())
            .with_post_filter(Box::new(HasChildQuery::new(
                self.child_type.as_str(),
                child_predicate,
            )))
            .with_size(usize::MAX);
        self.collection.search(&request)
    }

    /// Get the committed children of a parent, in write order.
    pub fn children_of(&self, parent_id: &str) -> Vec<Arc<AnalyzedDocument>> {
        let snapshot = self.collection.snapshot();
        let mut children: Vec<_> = snapshot
            .children(&self.child_type, parent_id)
            .cloned()
            .collect();
        children.sort_by_key(|child| child.seq_no);
        children
    }

    /// Buffer the delete of a child.
    pub fn delete_child(&self, child_id: &str) -> Result<()> {
        self.collection.delete(&self.child_type, child_id)
    }

    /// Buffer the delete of a parent.
    ///
    /// With `cascade`, the delete of every committed child is buffered too.
    /// Returns the number of children deleted.
    pub fn delete_parent(&self, parent_id: &str, cascade: bool) -> Result<usize> {
        self.collection.delete(&self.parent_type, parent_id)?;
        if !cascade {
            return Ok(0);
        }

        let children = self.children_of(parent_id);
        for child in &children {
            self.collection.delete(&self.child_type, &child.id)?;
        }
        debug!(
            "Cascading delete of '{}/{}' removed {} children",
            self.parent_type,
            parent_id,
            children.len()
        );
        Ok(children.len())
    }

    /// Commit the collection.
    pub fn commit(&self) -> Result<u64> {
        self.collection.commit()
    }
}
