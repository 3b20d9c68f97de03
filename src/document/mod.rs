//! Documents, field values and their analyzed form.
//!
//! A [`Document`] is the caller's source: a map from field name to
//! [`FieldValue`]. Nested sub-records are documents too, held in a
//! [`FieldValue::Nested`] sequence. The [`parser::DocumentParser`] checks a
//! document against its mapping and produces the [`AnalyzedDocument`] terms
//! that queries evaluate against.

pub mod analyzed;
pub mod converter;
#[allow(clippy::module_inception)]
pub mod document;
pub mod field_value;
pub mod parser;

// Re-export commonly used types
pub use analyzed::{AnalyzedDocument, AnalyzedFields};
pub use converter::JsonDocumentConverter;
pub use document::{Document, DocumentBuilder};
pub use field_value::FieldValue;
pub use parser::DocumentParser;
