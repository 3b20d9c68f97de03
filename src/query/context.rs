//! The evaluation scope of a query.

use crate::document::{AnalyzedDocument, AnalyzedFields};
use crate::index::snapshot::IndexSnapshot;
use crate::schema::FieldMapping;

/// What a query is evaluated against.
///
/// At the top level the scope is a document's root object. A nested query
/// narrows it to one nested object at a time, while `document` still names
/// the enclosing top-level document so joins keep working.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    snapshot: &'a IndexSnapshot,
    document: &'a AnalyzedDocument,
    fields: &'a AnalyzedFields,
}

impl<'a> MatchContext<'a> {
    /// Create a scope over the root object of a document.
    pub fn new(snapshot: &'a IndexSnapshot, document: &'a AnalyzedDocument) -> Self {
        MatchContext {
            snapshot,
            document,
            fields: &document.fields,
        }
    }

    /// Narrow the scope to one nested object of the current document.
    pub fn nested(&self, fields: &'a AnalyzedFields) -> Self {
        MatchContext {
            snapshot: self.snapshot,
            document: self.document,
            fields,
        }
    }

    /// Switch the scope to the root object of another document.
    pub fn with_document(&self, document: &'a AnalyzedDocument) -> Self {
        MatchContext::new(self.snapshot, document)
    }

    /// Get the snapshot being searched.
    pub fn snapshot(&self) -> &'a IndexSnapshot {
        self.snapshot
    }

    /// Get the enclosing top-level document.
    pub fn document(&self) -> &'a AnalyzedDocument {
        self.document
    }

    /// Get the terms of the object in scope.
    pub fn fields(&self) -> &'a AnalyzedFields {
        self.fields
    }

    /// Get the indexed terms of a field of the object in scope.
    pub fn terms(&self, field: &str) -> &'a [String] {
        self.fields.terms(field)
    }

    /// Resolve the mapping of a field of the enclosing document's type.
    pub fn field_mapping(&self, field: &str) -> Option<&'a FieldMapping> {
        self.snapshot
            .mappings()
            .get(&self.document.doc_type)
            .and_then(|mapping| mapping.field(field))
    }
}
