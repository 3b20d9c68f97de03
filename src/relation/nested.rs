//! Documents with nested sub-records.

use std::sync::Arc;

use crate::document::{Document, FieldValue};
use crate::error::{KindredError, Result};
use crate::index::Collection;
use crate::query::{NestedQuery, Query};
use crate::search::{SearchRequest, SearchResponse};

/// Indexes and queries one document type whose records embed nested objects.
#[derive(Debug, Clone)]
pub struct NestedStore {
    collection: Arc<Collection>,
    doc_type: String,
}

impl NestedStore {
    /// Create a store for documents of `doc_type` in a collection.
    pub fn new<T: Into<String>>(collection: Arc<Collection>, doc_type: T) -> Self {
        NestedStore {
            collection,
            doc_type: doc_type.into(),
        }
    }

    /// Get the underlying collection.
    pub fn collection(&self) -> &Arc<Collection> {
        &self.collection
    }

    /// Get the document type.
    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// Buffer a parent document together with the objects of one nested field.
    ///
    /// `sub_documents` may be empty. Each object is validated against the
    /// nested schema; one invalid object rejects the whole document.
    pub fn index_with_nested(
        &self,
        parent_id: &str,
        parent_fields: Document,
        nested_field: &str,
        sub_documents: Vec<Document>,
    ) -> Result<()> {
        if nested_field.is_empty() || nested_field.contains('.') {
            return Err(KindredError::validation(format!(
                "'{nested_field}' is not a top-level field name"
            )));
        }

        if let Some(field) = self
            .collection
            .mapping(&self.doc_type)
            .and_then(|mapping| mapping.field(nested_field).cloned())
        {
            if field.as_nested().is_none() {
                return Err(KindredError::validation(format!(
                    "field '{nested_field}' is mapped as {}, not nested",
                    field.kind_name()
                )));
            }
        }

        let mut document = parent_fields;
        document.add_field(nested_field, FieldValue::Nested(sub_documents));
        self.collection.put(&self.doc_type, parent_id, document)
    }

    /// Find the parents matching `top_level` that have at least one object in
    /// `nested_field` satisfying every clause of `nested_predicate` on its own.
    ///
    /// Searches committed documents only. Every match is returned.
    pub fn query_by_nested_match(
        &self,
        top_level: Box<dyn Query>,
        nested_field: &str,
        nested_predicate: Box<dyn Query>,
    ) -> Result<SearchResponse> {
        let request = SearchRequest::new(top_level)
            .with_type(self.doc_type.as_str())
            .with_post_filter(Box::new(NestedQuery::new(nested_field, nested_predicate)))
            .with_size(usize::MAX);
        self.collection.search(&request)
    }

    /// Commit the collection.
    pub fn commit(&self) -> Result<u64> {
        self.collection.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::CollectionSettings;
    use crate::query::{BooleanQuery, MatchAllQuery, TermQuery};
    use crate::schema::{Mapping, ObjectMapping};

    fn store() -> NestedStore {
        let collection = Arc::new(Collection::new("social", CollectionSettings::default(), None));
        collection
            .declare_mapping(
                Mapping::builder("profile")
                    .keyword("name")
                    .nested("connections", ObjectMapping::new().keyword("userId").text("type"))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        NestedStore::new(collection, "profile")
    }

    fn connection(user_id: &str, kind: &str) -> Document {
        Document::builder()
            .add_text("userId", user_id)
            .add_text("type", kind)
            .build()
    }

    fn bch_validated() -> Box<dyn Query> {
        Box::new(BooleanQuery::all_of(vec![
            Box::new(TermQuery::new("connections.userId", "BCH")),
            Box::new(TermQuery::new("connections.type", "validated")),
        ]))
    }

    #[test]
    fn test_index_and_query() {
        let store = store();
        let name = |n: &str| Document::builder().add_text("name", n).build();
        store
            .index_with_nested(
                "1",
                name("Frederic"),
                "connections",
                vec![connection("BCH", "Validated"), connection("TCL", "Pending")],
            )
            .unwrap();
        store
            .index_with_nested(
                "2",
                name("Philippe"),
                "connections",
                vec![connection("BCH", "Pending"), connection("TCL", "Validated")],
            )
            .unwrap();
        store.index_with_nested("3", name("Thibault"), "connections", vec![]).unwrap();
        store.commit().unwrap();

        let response = store
            .query_by_nested_match(Box::new(MatchAllQuery::new()), "connections", bch_validated())
            .unwrap();
        assert_eq!(response.total_hits, 1);
        assert_eq!(response.ids(), vec!["1"]);

        let response = store
            .query_by_nested_match(
                Box::new(TermQuery::new("name", "Philippe")),
                "connections",
                bch_validated(),
            )
            .unwrap();
        assert_eq!(response.total_hits, 0);
    }

    #[test]
    fn test_invalid_nested_input() {
        let store = store();
        let err = store
            .index_with_nested("1", Document::new(), "name", vec![])
            .unwrap_err();
        assert!(err.is_validation());

        let err = store
            .index_with_nested("1", Document::new(), "connections.userId", vec![])
            .unwrap_err();
        assert!(err.is_validation());

        let bad = Document::builder().add_integer("userId", 7).build();
        let err = store
            .index_with_nested("1", Document::new(), "connections", vec![bad])
            .unwrap_err();
        assert!(err.is_validation());
    }
}
