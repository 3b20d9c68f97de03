//! Analyzed documents: the index-ready form of a [`Document`].

use std::sync::Arc;

use ahash::AHashMap;

use crate::document::document::Document;

/// The terms of one object: a document root or one nested sub-document.
///
/// Terms are keyed by the full dotted path of the field, so a field of a
/// nested object is found under `connections.userId` both in mappings and in
/// queries. Nested objects hang off their parent under the path of the nested
/// field; they are never merged into the parent's own terms.
#[derive(Debug, Clone, Default)]
pub struct AnalyzedFields {
    terms: AHashMap<String, Vec<String>>,
    nested: AHashMap<String, Vec<AnalyzedFields>>,
}

impl AnalyzedFields {
    /// Create an empty set of analyzed fields.
    pub fn new() -> Self {
        AnalyzedFields::default()
    }

    /// Get the indexed terms of a field; empty when the field has none.
    pub fn terms(&self, path: &str) -> &[String] {
        self.terms.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get the nested objects stored under a nested field path.
    pub fn nested(&self, path: &str) -> &[AnalyzedFields] {
        self.nested.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append terms to a field.
    pub fn add_terms<I>(&mut self, path: &str, terms: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.terms.entry(path.to_string()).or_default().extend(terms);
    }

    /// Append one nested object to a nested field.
    pub fn push_nested(&mut self, path: &str, object: AnalyzedFields) {
        self.nested.entry(path.to_string()).or_default().push(object);
    }

    /// Get the paths of all fields that have terms.
    pub fn term_paths(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    /// Count the nested objects below this object, at every level.
    pub fn nested_object_count(&self) -> usize {
        self.nested
            .values()
            .flatten()
            .map(|object| 1 + object.nested_object_count())
            .sum()
    }
}

/// A document after validation and analysis, as held by a committed snapshot.
#[derive(Debug, Clone)]
pub struct AnalyzedDocument {
    /// Document identifier, unique per type within a collection.
    pub id: String,
    /// Document type tag.
    pub doc_type: String,
    /// Identifier of the parent document, for child types.
    pub parent: Option<String>,
    /// The original source.
    pub source: Arc<Document>,
    /// Analyzed terms of the root object and its nested objects.
    pub fields: AnalyzedFields,
    /// Write sequence number; later writes have higher numbers.
    pub seq_no: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_paths_are_empty() {
        let fields = AnalyzedFields::new();
        assert!(fields.terms("name").is_empty());
        assert!(fields.nested("connections").is_empty());
    }

    #[test]
    fn test_nested_objects_stay_separate() {
        let mut root = AnalyzedFields::new();
        root.add_terms("name", vec!["frederic".to_string()]);

        let mut first = AnalyzedFields::new();
        first.add_terms("connections.userId", vec!["BCH".to_string()]);
        let mut second = AnalyzedFields::new();
        second.add_terms("connections.userId", vec!["TCL".to_string()]);
        root.push_nested("connections", first);
        root.push_nested("connections", second);

        assert!(root.terms("connections.userId").is_empty());
        assert_eq!(root.nested("connections").len(), 2);
        assert_eq!(root.nested("connections")[1].terms("connections.userId"), ["TCL"]);
        assert_eq!(root.nested_object_count(), 2);
    }
}
