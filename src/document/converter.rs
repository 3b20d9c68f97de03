//! JSON document converter.
//!
//! Converts JSON sources, as sent in bulk requests, into
//! [`Document`]s and back:
//!
//! ```json
//! { "name": "Frederic",
//!   "connections": [ { "userId": "BCH", "type": "validated" } ] }
//! ```
//!
//! JSON objects, and arrays made only of objects, become
//! [`FieldValue::Nested`] sub-documents.

use serde_json::{Map, Number, Value};

use crate::document::document::Document;
use crate::document::field_value::FieldValue;
use crate::error::{KindredError, Result};

/// A document converter for JSON sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDocumentConverter;

impl JsonDocumentConverter {
    /// Create a new JSON converter.
    pub fn new() -> Self {
        JsonDocumentConverter
    }

    /// Convert a JSON string into a document.
    pub fn convert_str(&self, source: &str) -> Result<Document> {
        let value: Value = serde_json::from_str(source)?;
        self.convert(&value)
    }

    /// Convert a JSON object into a document.
    pub fn convert(&self, value: &Value) -> Result<Document> {
        let object = value.as_object().ok_or_else(|| {
            KindredError::validation(format!(
                "document source must be a JSON object, got {}",
                json_type_name(value)
            ))
        })?;
        Ok(self.convert_object(object))
    }

    fn convert_object(&self, object: &Map<String, Value>) -> Document {
        let mut document = Document::new();
        for (name, value) in object {
            document.add_field(name.clone(), self.convert_value(value));
        }
        document
    }

    fn convert_value(&self, value: &Value) -> FieldValue {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Object(object) => FieldValue::Nested(vec![self.convert_object(object)]),
            Value::Array(values) => {
                if !values.is_empty() && values.iter().all(Value::is_object) {
                    FieldValue::Nested(
                        values
                            .iter()
                            .filter_map(Value::as_object)
                            .map(|object| self.convert_object(object))
                            .collect(),
                    )
                } else {
                    FieldValue::Array(values.iter().map(|v| self.convert_value(v)).collect())
                }
            }
        }
    }

    /// Convert a document back into its JSON source.
    pub fn to_json(&self, document: &Document) -> Value {
        let object: Map<String, Value> = document
            .fields()
            .iter()
            .map(|(name, value)| (name.clone(), self.value_to_json(value)))
            .collect();
        Value::Object(object)
    }

    fn value_to_json(&self, value: &FieldValue) -> Value {
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Integer(i) => Value::Number((*i).into()),
            FieldValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Array(values) => {
                Value::Array(values.iter().map(|v| self.value_to_json(v)).collect())
            }
            FieldValue::Nested(objects) => {
                Value::Array(objects.iter().map(|o| self.to_json(o)).collect())
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
