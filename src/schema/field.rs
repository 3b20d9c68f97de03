//! Field kinds for mapping definitions.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, KeywordAnalyzer, StandardAnalyzer};
use crate::error::{KindredError, Result};

static KEYWORD_ANALYZER: LazyLock<KeywordAnalyzer> = LazyLock::new(KeywordAnalyzer::new);
static STANDARD_ANALYZER: LazyLock<StandardAnalyzer> = LazyLock::new(StandardAnalyzer::new);

/// Policy for fields that a mapping does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dynamic {
    /// Unmapped fields are added to the mapping with an inferred kind.
    #[default]
    True,
    /// Unmapped fields are kept in the source but not indexed.
    False,
    /// Unmapped fields reject the document.
    Strict,
}

impl Dynamic {
    /// Parse the `dynamic` setting of a JSON mapping (`true`, `false` or `"strict"`).
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Bool(true) => Ok(Dynamic::True),
            serde_json::Value::Bool(false) => Ok(Dynamic::False),
            serde_json::Value::String(s) => match s.as_str() {
                "true" => Ok(Dynamic::True),
                "false" => Ok(Dynamic::False),
                "strict" => Ok(Dynamic::Strict),
                other => Err(KindredError::configuration(format!(
                    "unknown dynamic setting '{other}'"
                ))),
            },
            other => Err(KindredError::configuration(format!(
                "unknown dynamic setting '{other}'"
            ))),
        }
    }
}

/// The declared kind of a single field.
///
/// The kind decides how a value is turned into index terms and therefore how
/// it matches at query time: keyword values only match literally, text values
/// match on their lowercased word tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldMapping {
    /// Exact-match string, indexed as one untouched term.
    Keyword,
    /// Analyzed string, indexed as lowercased word tokens.
    Text,
    /// 64-bit signed integer.
    Long,
    /// 64-bit floating point number.
    Double,
    /// true/false.
    Boolean,
    /// Ordered sequence of sub-objects matched one object at a time.
    Nested(ObjectMapping),
}

impl FieldMapping {
    /// Create a nested field from an object schema.
    pub fn nested(object: ObjectMapping) -> Self {
        FieldMapping::Nested(object)
    }

    /// Get the name of this field kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldMapping::Keyword => "keyword",
            FieldMapping::Text => "text",
            FieldMapping::Long => "long",
            FieldMapping::Double => "double",
            FieldMapping::Boolean => "boolean",
            FieldMapping::Nested(_) => "nested",
        }
    }

    /// Whether values of this kind are strings.
    pub fn is_string(&self) -> bool {
        matches!(self, FieldMapping::Keyword | FieldMapping::Text)
    }

    /// Get the analyzer used for string values of this kind.
    pub fn analyzer(&self) -> Option<&'static dyn Analyzer> {
        match self {
            FieldMapping::Keyword => Some(&*KEYWORD_ANALYZER),
            FieldMapping::Text => Some(&*STANDARD_ANALYZER),
            _ => None,
        }
    }

    /// Get the object schema of a nested field.
    pub fn as_nested(&self) -> Option<&ObjectMapping> {
        match self {
            FieldMapping::Nested(object) => Some(object),
            _ => None,
        }
    }

    /// Parse one entry of a JSON `properties` block.
    ///
    /// Accepts `keyword`, `text`, `long`, `integer`, `double`, `float`,
    /// `boolean` and `nested`, plus `string`, which is analyzed text unless
    /// `"index": "not_analyzed"` makes it a keyword.
    pub fn from_json(name: &str, value: &serde_json::Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            KindredError::configuration(format!("mapping for field '{name}' must be an object"))
        })?;

        // An object with properties and no type is an implicit nested object.
        let type_name = match object.get("type") {
            Some(t) => t.as_str().ok_or_else(|| {
                KindredError::configuration(format!("type of field '{name}' must be a string"))
            })?,
            None if object.contains_key("properties") => "nested",
            None => {
                return Err(KindredError::configuration(format!(
                    "field '{name}' has no type"
                )));
            }
        };

        match type_name {
            "string" => match object.get("index").and_then(|i| i.as_str()) {
                Some("not_analyzed") => Ok(FieldMapping::Keyword),
                Some("analyzed") | None => Ok(FieldMapping::Text),
                Some(other) => Err(KindredError::configuration(format!(
                    "unsupported index option '{other}' for field '{name}'"
                ))),
            },
            "keyword" => Ok(FieldMapping::Keyword),
            "text" => Ok(FieldMapping::Text),
            "long" | "integer" | "short" | "byte" => Ok(FieldMapping::Long),
            "double" | "float" => Ok(FieldMapping::Double),
            "boolean" => Ok(FieldMapping::Boolean),
            "nested" => Ok(FieldMapping::Nested(ObjectMapping::from_json(value)?)),
            other => Err(KindredError::configuration(format!(
                "unsupported type '{other}' for field '{name}'"
            ))),
        }
    }
}

/// The schema of an object: the root of a document or a nested sub-object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectMapping {
    /// Field definitions by name.
    #[serde(default)]
    pub properties: BTreeMap<String, FieldMapping>,
    /// Policy for undeclared fields; inherited from the enclosing object when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<Dynamic>,
}

impl ObjectMapping {
    /// Create a new empty object schema.
    pub fn new() -> Self {
        ObjectMapping::default()
    }

    /// Add a field definition.
    pub fn with_field<S: Into<String>>(mut self, name: S, field: FieldMapping) -> Self {
        self.properties.insert(name.into(), field);
        self
    }

    /// Add an exact-match string field.
    pub fn keyword<S: Into<String>>(self, name: S) -> Self {
        self.with_field(name, FieldMapping::Keyword)
    }

    /// Add an analyzed text field.
    pub fn text<S: Into<String>>(self, name: S) -> Self {
        self.with_field(name, FieldMapping::Text)
    }

    /// Add a nested field.
    pub fn nested<S: Into<String>>(self, name: S, object: ObjectMapping) -> Self {
        self.with_field(name, FieldMapping::Nested(object))
    }

    /// Set the dynamic policy.
    pub fn with_dynamic(mut self, dynamic: Dynamic) -> Self {
        self.dynamic = Some(dynamic);
        self
    }

    /// Get a field definition by its local name.
    pub fn get(&self, name: &str) -> Option<&FieldMapping> {
        self.properties.get(name)
    }

    /// Resolve a dotted path (`connections.userId`) through nested objects.
    pub fn resolve(&self, path: &str) -> Option<&FieldMapping> {
        match path.split_once('.') {
            None => self.properties.get(path),
            Some((head, rest)) => match self.properties.get(head) {
                Some(FieldMapping::Nested(object)) => object.resolve(rest),
                // Dotted names that are not nested paths may be declared verbatim.
                _ => self.properties.get(path),
            },
        }
    }

    /// Parse an object holding a `properties` block and an optional `dynamic` setting.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let mut object = ObjectMapping::new();

        if let Some(dynamic) = value.get("dynamic") {
            object.dynamic = Some(Dynamic::from_json(dynamic)?);
        }

        if let Some(properties) = value.get("properties") {
            let properties = properties.as_object().ok_or_else(|| {
                KindredError::configuration("'properties' must be an object")
            })?;
            for (name, field) in properties {
                if name.is_empty() {
                    return Err(KindredError::configuration("field name cannot be empty"));
                }
                object
                    .properties
                    .insert(name.clone(), FieldMapping::from_json(name, field)?);
            }
        }

        Ok(object)
    }

    /// Merge another declaration of the same object into this one.
    ///
    /// New fields are added. A field declared in both must have the same kind;
    /// nested fields are merged recursively. `prefix` is the dotted path of
    /// this object, used in error messages.
    pub fn merge(&mut self, other: &ObjectMapping, prefix: &str) -> Result<()> {
        for (name, incoming) in &other.properties {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };

            match self.properties.get_mut(name) {
                None => {
                    self.properties.insert(name.clone(), incoming.clone());
                }
                Some(FieldMapping::Nested(existing)) => match incoming {
                    FieldMapping::Nested(incoming_object) => {
                        existing.merge(incoming_object, &path)?;
                    }
                    _ => {
                        return Err(KindredError::configuration(format!(
                            "field '{path}' is mapped as nested and cannot become {}",
                            incoming.kind_name()
                        )));
                    }
                },
                Some(existing) => {
                    if existing != incoming {
                        return Err(KindredError::configuration(format!(
                            "field '{path}' is mapped as {} and cannot become {}",
                            existing.kind_name(),
                            incoming.kind_name()
                        )));
                    }
                }
            }
        }

        if other.dynamic.is_some() {
            self.dynamic = other.dynamic;
        }

        Ok(())
    }
}
