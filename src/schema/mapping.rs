//! Mapping declarations for a single document type.

use serde::{Deserialize, Serialize};

use crate::error::{KindredError, Result};
use crate::schema::field::{Dynamic, FieldMapping, ObjectMapping};

/// The mapping of one document type within a collection.
///
/// A mapping is declared before documents of its type are ingested. It can be
/// redeclared with additional fields, but never with a field of a different
/// kind or a different parent type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    /// The document type this mapping applies to.
    doc_type: String,
    /// The type of the parent documents, for child types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_type: Option<String>,
    /// The schema of the document root.
    root: ObjectMapping,
}

impl Mapping {
    /// Create a new empty mapping for a document type.
    pub fn new<S: Into<String>>(doc_type: S) -> Self {
        Mapping {
            doc_type: doc_type.into(),
            parent_type: None,
            root: ObjectMapping::new(),
        }
    }

    /// Create a builder for constructing mappings.
    pub fn builder<S: Into<String>>(doc_type: S) -> MappingBuilder {
        MappingBuilder::new(doc_type)
    }

    /// Parse a JSON mapping.
    ///
    /// Both the bare form `{"_parent": {...}, "properties": {...}}` and the form
    /// wrapped in the type name `{"profile": {"properties": {...}}}` are accepted.
    ///
    /// ```
    /// use kindred::schema::{FieldMapping, Mapping};
    ///
    /// let mapping = Mapping::from_json("connection", &serde_json::json!({
    ///     "_parent": { "type": "profile" },
    ///     "properties": {
    ///         "sender": { "type": "string", "index": "not_analyzed" }
    ///     }
    /// })).unwrap();
    ///
    /// assert_eq!(mapping.parent_type(), Some("profile"));
    /// assert_eq!(mapping.field("sender"), Some(&FieldMapping::Keyword));
    /// ```
    pub fn from_json(doc_type: &str, value: &serde_json::Value) -> Result<Self> {
        let body = match value.get(doc_type) {
            Some(inner) if inner.is_object() => inner,
            _ => value,
        };

        if !body.is_object() {
            return Err(KindredError::configuration(format!(
                "mapping for type '{doc_type}' must be a JSON object"
            )));
        }

        let parent_type = match body.get("_parent") {
            Some(parent) => Some(
                parent
                    .get("type")
                    .and_then(|t| t.as_str())
                    .ok_or_else(|| {
                        KindredError::configuration(format!(
                            "_parent of type '{doc_type}' must name a type"
                        ))
                    })?
                    .to_string(),
            ),
            None => None,
        };

        if parent_type.as_deref() == Some(doc_type) {
            return Err(KindredError::configuration(format!(
                "type '{doc_type}' cannot be its own parent"
            )));
        }

        Ok(Mapping {
            doc_type: doc_type.to_string(),
            parent_type,
            root: ObjectMapping::from_json(body)?,
        })
    }

    /// Get the document type.
    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// Get the parent type, if this is a child type.
    pub fn parent_type(&self) -> Option<&str> {
        self.parent_type.as_deref()
    }

    /// Get the root object schema.
    pub fn root(&self) -> &ObjectMapping {
        &self.root
    }

    /// Get a mutable reference to the root object schema.
    pub(crate) fn root_mut(&mut self) -> &mut ObjectMapping {
        &mut self.root
    }

    /// Resolve a (possibly dotted) field path.
    pub fn field(&self, path: &str) -> Option<&FieldMapping> {
        self.root.resolve(path)
    }

    /// Get the effective dynamic policy of the root object.
    pub fn dynamic(&self, default: Dynamic) -> Dynamic {
        self.root.dynamic.unwrap_or(default)
    }

    /// Get the dotted paths of all nested fields, outermost first.
    pub fn nested_paths(&self) -> Vec<String> {
        fn collect(object: &ObjectMapping, prefix: &str, out: &mut Vec<String>) {
            for (name, field) in &object.properties {
                if let FieldMapping::Nested(inner) = field {
                    let path = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{prefix}.{name}")
                    };
                    out.push(path.clone());
                    collect(inner, &path, out);
                }
            }
        }

        let mut paths = Vec::new();
        collect(&self.root, "", &mut paths);
        paths
    }

    /// Merge a redeclaration of this type into the mapping.
    pub fn merge(&mut self, other: &Mapping) -> Result<()> {
        if self.doc_type != other.doc_type {
            return Err(KindredError::configuration(format!(
                "cannot merge mapping of type '{}' into type '{}'",
                other.doc_type, self.doc_type
            )));
        }

        if self.parent_type != other.parent_type {
            return Err(KindredError::configuration(format!(
                "type '{}' has parent {:?} and cannot change it to {:?}",
                self.doc_type, self.parent_type, other.parent_type
            )));
        }

        // Validate against a copy so a failed merge leaves the mapping untouched.
        let mut merged = self.root.clone();
        merged.merge(&other.root, "")?;
        self.root = merged;
        Ok(())
    }
}

/// A builder for constructing mappings in a fluent manner.
#[derive(Debug)]
pub struct MappingBuilder {
    mapping: Mapping,
}

impl MappingBuilder {
    /// Create a new mapping builder.
    pub fn new<S: Into<String>>(doc_type: S) -> Self {
        MappingBuilder {
            mapping: Mapping::new(doc_type),
        }
    }

    /// Declare the parent type of this child type.
    pub fn parent<S: Into<String>>(mut self, parent_type: S) -> Self {
        self.mapping.parent_type = Some(parent_type.into());
        self
    }

    /// Add an exact-match string field.
    pub fn keyword<S: Into<String>>(self, name: S) -> Self {
        self.field(name, FieldMapping::Keyword)
    }

    /// Add an analyzed text field.
    pub fn text<S: Into<String>>(self, name: S) -> Self {
        self.field(name, FieldMapping::Text)
    }

    /// Add a nested field.
    pub fn nested<S: Into<String>>(self, name: S, object: ObjectMapping) -> Self {
        self.field(name, FieldMapping::Nested(object))
    }

    /// Add a field of any kind.
    pub fn field<S: Into<String>>(mut self, name: S, field: FieldMapping) -> Self {
        self.mapping.root.properties.insert(name.into(), field);
        self
    }

    /// Set the dynamic policy of the root object.
    pub fn dynamic(mut self, dynamic: Dynamic) -> Self {
        self.mapping.root.dynamic = Some(dynamic);
        self
    }

    /// Build the final mapping.
    pub fn build(self) -> Result<Mapping> {
        if self.mapping.doc_type.is_empty() {
            return Err(KindredError::configuration("document type cannot be empty"));
        }
        if self.mapping.parent_type.as_deref() == Some(self.mapping.doc_type.as_str()) {
            return Err(KindredError::configuration(format!(
                "type '{}' cannot be its own parent",
                self.mapping.doc_type
            )));
        }
        Ok(self.mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile_json() -> serde_json::Value {
        json!({
            "properties": {
                "name": { "type": "string" },
                "connections": {
                    "type": "nested",
                    "properties": {
                        "userId": { "type": "string", "index": "not_analyzed" },
                        "type": { "type": "string" }
                    }
                }
            }
        })
    }

    #[test]
    fn test_parse_nested_mapping() {
        let mapping = Mapping::from_json("profile", &profile_json()).unwrap();

        assert_eq!(mapping.doc_type(), "profile");
        assert_eq!(mapping.parent_type(), None);
        assert_eq!(mapping.field("name"), Some(&FieldMapping::Text));
        assert_eq!(
            mapping.field("connections.userId"),
            Some(&FieldMapping::Keyword)
        );
        assert_eq!(mapping.field("connections.type"), Some(&FieldMapping::Text));
        assert_eq!(mapping.nested_paths(), vec!["connections".to_string()]);
    }

    #[test]
    fn test_parse_wrapped_mapping() {
        let wrapped = json!({ "profile": profile_json() });
        let mapping = Mapping::from_json("profile", &wrapped).unwrap();
        assert!(mapping.field("connections").is_some());
    }

    #[test]
    fn test_builder_matches_json() {
        let built = Mapping::builder("profile")
            .text("name")
            .nested(
                "connections",
                ObjectMapping::new().keyword("userId").text("type"),
            )
            .build()
            .unwrap();

        let parsed = Mapping::from_json("profile", &profile_json()).unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn test_merge_same_mapping_is_noop() {
        let mut mapping = Mapping::from_json("profile", &profile_json()).unwrap();
        let again = mapping.clone();

        mapping.merge(&again).unwrap();
        assert_eq!(mapping, again);
    }

    #[test]
    fn test_merge_conflicting_kind_leaves_mapping_untouched() {
        let mut mapping = Mapping::builder("profile").keyword("name").build().unwrap();
        let original = mapping.clone();
        let conflicting = Mapping::builder("profile")
            .text("bio")
            .text("name")
            .build()
            .unwrap();

        let err = mapping.merge(&conflicting).unwrap_err();
        assert!(matches!(err, KindredError::Configuration(_)));
        assert_eq!(mapping, original);
    }

    #[test]
    fn test_merge_rejects_parent_change() {
        let mut mapping = Mapping::builder("connection")
            .parent("profile")
            .keyword("sender")
            .build()
            .unwrap();
        let orphan = Mapping::builder("connection").keyword("sender").build().unwrap();

        assert!(mapping.merge(&orphan).is_err());
    }

    #[test]
    fn test_self_parent_rejected() {
        assert!(Mapping::builder("profile").parent("profile").build().is_err());
        assert!(Mapping::from_json("profile", &json!({"_parent": {"type": "profile"}})).is_err());
    }
}
