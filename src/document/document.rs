//! Document structure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::field_value::FieldValue;

/// A document represents a single item to be indexed, or one sub-record of
/// a nested field.
///
/// Field order is kept sorted by name so that the JSON source of a document
/// is stable.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Document {
    /// The field values for this document
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Document {
            fields: BTreeMap::new(),
        }
    }

    /// Add a field value to the document, replacing any previous value.
    pub fn add_field<S: Into<String>>(&mut self, name: S, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Get a field value from the document.
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Check if the document has a field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Remove a field from the document.
    pub fn remove_field(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Get all field names.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(|s| s.as_str()).collect()
    }

    /// Get all field values.
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Create a builder for constructing documents.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }
}

/// A builder for constructing documents in a fluent manner.
///
/// ```
/// use kindred::document::Document;
///
/// let profile = Document::builder()
///     .add_text("name", "Frederic")
///     .add_nested("connections", vec![
///         Document::builder()
///             .add_text("userId", "BCH")
///             .add_text("type", "validated")
///             .build(),
///     ])
///     .build();
///
/// assert_eq!(profile.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    /// Create a new document builder.
    pub fn new() -> Self {
        DocumentBuilder {
            document: Document::new(),
        }
    }

    /// Add a string field to the document.
    ///
    /// Whether the value is matched exactly or by its word tokens depends on
    /// the kind the mapping declares for the field.
    pub fn add_text<S: Into<String>, T: Into<String>>(mut self, name: S, value: T) -> Self {
        self.document
            .add_field(name, FieldValue::Text(value.into()));
        self
    }

    /// Add an integer field to the document.
    pub fn add_integer<S: Into<String>>(mut self, name: S, value: i64) -> Self {
        self.document.add_field(name, FieldValue::Integer(value));
        self
    }

    /// Add a float field to the document.
    pub fn add_float<S: Into<String>>(mut self, name: S, value: f64) -> Self {
        self.document.add_field(name, FieldValue::Float(value));
        self
    }

    /// Add a boolean field to the document.
    pub fn add_boolean<S: Into<String>>(mut self, name: S, value: bool) -> Self {
        self.document.add_field(name, FieldValue::Boolean(value));
        self
    }

    /// Add a nested field holding an ordered sequence of sub-documents.
    pub fn add_nested<S: Into<String>>(mut self, name: S, objects: Vec<Document>) -> Self {
        self.document.add_field(name, FieldValue::Nested(objects));
        self
    }

    /// Add a field with a generic value.
    pub fn add_field<S: Into<String>>(mut self, name: S, value: FieldValue) -> Self {
        self.document.add_field(name, value);
        self
    }

    /// Build the final document.
    pub fn build(self) -> Document {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_accessors() {
        let doc = Document::builder()
            .add_text("name", "Frederic")
            .add_integer("age", 42)
            .add_boolean("active", true)
            .build();

        assert_eq!(doc.len(), 3);
        assert!(doc.has_field("name"));
        assert_eq!(doc.get_field("age"), Some(&FieldValue::Integer(42)));
        assert_eq!(doc.field_names(), vec!["active", "age", "name"]);
    }

    #[test]
    fn test_add_field_replaces() {
        let mut doc = Document::new();
        doc.add_field("name", FieldValue::Text("Frederic".into()));
        doc.add_field("name", FieldValue::Text("Philippe".into()));

        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get_field("name").and_then(|v| v.as_text()), Some("Philippe"));
        assert!(doc.remove_field("name").is_some());
        assert!(doc.is_empty());
    }
}
