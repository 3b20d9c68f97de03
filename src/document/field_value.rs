//! Field value types for documents.
//!
//! - **Text** - String data; exact or analyzed depending on the mapping
//! - **Integer** / **Float** - numbers
//! - **Boolean** - true/false values
//! - **Array** - several values of one field
//! - **Nested** - an ordered sequence of sub-documents
//! - **Null** - explicit null values
//!
//! ```
//! use kindred::document::field_value::FieldValue;
//!
//! let text_value = FieldValue::Text("hello".to_string());
//! assert_eq!(text_value.as_text(), Some("hello"));
//! assert_eq!(text_value.type_name(), "string");
//! ```

use serde::{Deserialize, Serialize};

use crate::document::document::Document;

/// Represents a value for a field in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Text value
    Text(String),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// Several values for one field
    Array(Vec<FieldValue>),
    /// Ordered sub-documents of a nested field
    Nested(Vec<Document>),
    /// Null value
    Null,
}

impl FieldValue {
    /// Convert to text if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the sub-documents if this is a nested value.
    pub fn as_nested(&self) -> Option<&[Document]> {
        match self {
            FieldValue::Nested(objects) => Some(objects),
            _ => None,
        }
    }

    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Get a short name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "string",
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Array(_) => "array",
            FieldValue::Nested(_) => "object",
            FieldValue::Null => "null",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}
