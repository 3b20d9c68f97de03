//! Document parser for converting documents into analyzed documents.
//!
//! The [`DocumentParser`] bridges the gap between a raw [`Document`] and the
//! index: it walks the document alongside its [`Mapping`], rejects values
//! whose kind conflicts with the declared field kind, and turns every value
//! into index terms.
//!
//! # Field Kind Handling
//!
//! - **keyword**: the whole string is one term
//! - **text**: lowercased Unicode word tokens
//! - **long/double/boolean**: the value's string representation
//! - **nested**: every sub-document is analyzed on its own and kept apart
//!   from its siblings
//!
//! Fields the mapping does not declare follow the dynamic policy. Under
//! `Dynamic::True` their kind is inferred and returned as a mapping update
//! the caller merges into the collection.
//!
//! ```
//! use kindred::document::{Document, DocumentParser};
//! use kindred::schema::{Dynamic, Mapping, ObjectMapping};
//!
//! let mapping = Mapping::builder("profile")
//!     .text("name")
//!     .nested("connections", ObjectMapping::new().keyword("userId").text("type"))
//!     .build()
//!     .unwrap();
//!
//! let doc = Document::builder()
//!     .add_text("name", "Frederic")
//!     .add_nested("connections", vec![
//!         Document::builder().add_text("userId", "BCH").add_text("type", "Validated").build(),
//!     ])
//!     .build();
//!
//! let parsed = DocumentParser::new(&mapping, Dynamic::True).parse(&doc).unwrap();
//! assert_eq!(parsed.fields.terms("name"), ["frederic"]);
//! let connection = &parsed.fields.nested("connections")[0];
//! assert_eq!(connection.terms("connections.userId"), ["BCH"]);
//! assert_eq!(connection.terms("connections.type"), ["validated"]);
//! ```

use crate::document::analyzed::AnalyzedFields;
use crate::document::document::Document;
use crate::document::field_value::FieldValue;
use crate::error::{KindredError, Result};
use crate::schema::field::{Dynamic, FieldMapping, ObjectMapping};
use crate::schema::mapping::Mapping;

/// The result of parsing one document.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Analyzed terms of the document.
    pub fields: AnalyzedFields,
    /// Fields added by dynamic mapping, shaped like the root object schema.
    pub mapping_update: ObjectMapping,
}

impl ParsedDocument {
    /// Whether parsing inferred any new field.
    pub fn has_mapping_update(&self) -> bool {
        fn has_fields(object: &ObjectMapping) -> bool {
            object.properties.values().any(|field| match field {
                FieldMapping::Nested(inner) => has_fields(inner),
                _ => true,
            })
        }
        has_fields(&self.mapping_update)
    }
}

/// A document parser that validates documents against a mapping and analyzes them.
#[derive(Debug, Clone, Copy)]
pub struct DocumentParser<'a> {
    mapping: &'a Mapping,
    default_dynamic: Dynamic,
}

impl<'a> DocumentParser<'a> {
    /// Create a parser for documents of one mapped type.
    ///
    /// `default_dynamic` applies when the mapping does not set its own policy.
    pub fn new(mapping: &'a Mapping, default_dynamic: Dynamic) -> Self {
        DocumentParser {
            mapping,
            default_dynamic,
        }
    }

    /// Validate and analyze a document.
    pub fn parse(&self, document: &Document) -> Result<ParsedDocument> {
        let mut fields = AnalyzedFields::new();
        let mut mapping_update = ObjectMapping::new();

        self.parse_object(
            self.mapping.root(),
            document,
            "",
            self.default_dynamic,
            &mut fields,
            &mut mapping_update,
        )?;

        Ok(ParsedDocument {
            fields,
            mapping_update,
        })
    }

    fn parse_object(
        &self,
        object: &ObjectMapping,
        source: &Document,
        prefix: &str,
        inherited: Dynamic,
        out: &mut AnalyzedFields,
        updates: &mut ObjectMapping,
    ) -> Result<()> {
        let dynamic = object.dynamic.unwrap_or(inherited);

        for (name, value) in source.fields() {
            if name.is_empty() {
                return Err(KindredError::validation("field name cannot be empty"));
            }
            let path = join_path(prefix, name);

            if let Some(field) = object.get(name) {
                match field {
                    FieldMapping::Nested(inner) => {
                        let inner_updates = nested_updates(updates, name);
                        self.index_nested(inner, value, &path, dynamic, out, inner_updates)?;
                    }
                    scalar => index_scalar(scalar, value, &path, out)?,
                }
                continue;
            }

            match dynamic {
                Dynamic::Strict => {
                    return Err(KindredError::validation(format!(
                        "field '{path}' is not mapped and dynamic mapping is strict"
                    )));
                }
                Dynamic::False => continue,
                Dynamic::True => {}
            }

            let Some(inferred) = infer_mapping(value) else {
                continue;
            };

            let entry = updates
                .properties
                .entry(name.clone())
                .or_insert_with(|| inferred.clone());
            if entry.kind_name() != inferred.kind_name() {
                return Err(KindredError::validation(format!(
                    "field '{path}' was inferred as {} and cannot also hold {}",
                    entry.kind_name(),
                    value.type_name()
                )));
            }

            match entry {
                FieldMapping::Nested(inner_updates) => {
                    // Sub-fields of a new nested field are all inferred into its update.
                    let empty = ObjectMapping::new();
                    self.index_nested(&empty, value, &path, dynamic, out, inner_updates)?;
                }
                scalar => index_scalar(scalar, value, &path, out)?,
            }
        }

        Ok(())
    }

    fn index_nested(
        &self,
        object: &ObjectMapping,
        value: &FieldValue,
        path: &str,
        dynamic: Dynamic,
        out: &mut AnalyzedFields,
        updates: &mut ObjectMapping,
    ) -> Result<()> {
        match value {
            FieldValue::Null => Ok(()),
            FieldValue::Nested(objects) => {
                for source in objects {
                    let mut fields = AnalyzedFields::new();
                    self.parse_object(object, source, path, dynamic, &mut fields, updates)?;
                    out.push_nested(path, fields);
                }
                Ok(())
            }
            FieldValue::Array(values) => {
                for value in values {
                    self.index_nested(object, value, path, dynamic, out, updates)?;
                }
                Ok(())
            }
            other => Err(KindredError::validation(format!(
                "field '{path}' is mapped as nested and cannot hold {}",
                other.type_name()
            ))),
        }
    }
}

fn index_scalar(
    field: &FieldMapping,
    value: &FieldValue,
    path: &str,
    out: &mut AnalyzedFields,
) -> Result<()> {
    let terms = match (field, value) {
        (_, FieldValue::Null) => return Ok(()),
        (_, FieldValue::Array(values)) => {
            for value in values {
                index_scalar(field, value, path, out)?;
            }
            return Ok(());
        }
        (FieldMapping::Keyword | FieldMapping::Text, FieldValue::Text(text)) => match field.analyzer() {
            Some(analyzer) => analyzer.terms(text)?,
            None => vec![text.clone()],
        },
        (FieldMapping::Long, FieldValue::Integer(i)) => vec![i.to_string()],
        (FieldMapping::Double, FieldValue::Integer(i)) => vec![(*i as f64).to_string()],
        (FieldMapping::Double, FieldValue::Float(f)) => vec![f.to_string()],
        (FieldMapping::Boolean, FieldValue::Boolean(b)) => vec![b.to_string()],
        (field, value) => {
            return Err(KindredError::validation(format!(
                "field '{path}' is mapped as {} and cannot hold {}",
                field.kind_name(),
                value.type_name()
            )));
        }
    };

    out.add_terms(path, terms);
    Ok(())
}

/// Infer the kind of an unmapped field from its value.
///
/// Returns `None` for values that carry no kind (nulls, empty arrays).
pub fn infer_mapping(value: &FieldValue) -> Option<FieldMapping> {
    match value {
        FieldValue::Text(_) => Some(FieldMapping::Text),
        FieldValue::Integer(_) => Some(FieldMapping::Long),
        FieldValue::Float(_) => Some(FieldMapping::Double),
        FieldValue::Boolean(_) => Some(FieldMapping::Boolean),
        FieldValue::Nested(_) => Some(FieldMapping::Nested(ObjectMapping::new())),
        FieldValue::Array(values) => values.iter().find_map(infer_mapping),
        FieldValue::Null => None,
    }
}

fn nested_updates<'u>(updates: &'u mut ObjectMapping, name: &str) -> &'u mut ObjectMapping {
    let entry = updates
        .properties
        .entry(name.to_string())
        .or_insert_with(|| FieldMapping::Nested(ObjectMapping::new()));
    if !matches!(entry, FieldMapping::Nested(_)) {
        *entry = FieldMapping::Nested(ObjectMapping::new());
    }
    match entry {
        FieldMapping::Nested(inner) => inner,
        _ => unreachable!("entry was just set to a nested mapping"),
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
