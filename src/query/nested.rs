//! Nested query: match a predicate against single nested objects.

use std::any::Any;

use crate::document::AnalyzedFields;
use crate::error::{KindredError, Result};
use crate::query::context::MatchContext;
use crate::query::query::Query;
use crate::schema::MappingSet;

/// A query that matches when at least one object of a nested field satisfies
/// the inner query on its own.
///
/// Every clause of the inner query is evaluated against the same object, so
/// `userId = BCH AND type = Validated` never matches a document where one
/// connection has the user and another one has the type. Inner field names
/// are full dotted paths such as `connections.userId`.
#[derive(Debug, Clone)]
pub struct NestedQuery {
    path: String,
    query: Box<dyn Query>,
}

impl NestedQuery {
    /// Create a new nested query.
    pub fn new<P: Into<String>>(path: P, query: Box<dyn Query>) -> Self {
        NestedQuery {
            path: path.into(),
            query,
        }
    }

    /// Get the nested field path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the inner query.
    pub fn query(&self) -> &dyn Query {
        self.query.as_ref()
    }
}

/// Collect the objects stored under `path`, descending through enclosing
/// nested objects when the scope is an ancestor of the path.
fn objects_at<'a>(fields: &'a AnalyzedFields, path: &str, out: &mut Vec<&'a AnalyzedFields>) {
    let direct = fields.nested(path);
    if !direct.is_empty() {
        out.extend(direct);
        return;
    }

    for (split, _) in path.match_indices('.') {
        let prefix = &path[..split];
        let parents = fields.nested(prefix);
        if !parents.is_empty() {
            for parent in parents {
                objects_at(parent, path, out);
            }
            return;
        }
    }
}

impl Query for NestedQuery {
    fn matches(&self, ctx: &MatchContext<'_>) -> Result<bool> {
        let mut objects = Vec::new();
        objects_at(ctx.fields(), &self.path, &mut objects);

        for object in objects {
            if self.query.matches(&ctx.nested(object))? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn validate(&self, mappings: &MappingSet) -> Result<()> {
        if !mappings.has_nested_path(&self.path) {
            return Err(KindredError::query(format!(
                "[nested] failed to find nested object under path [{}]",
                self.path
            )));
        }
        self.query.validate(mappings)
    }

    fn description(&self) -> String {
        format!("nested({}, {})", self.path, self.query.description())
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::index::snapshot::IndexSnapshot;
    use crate::query::boolean::BooleanQuery;
    use crate::query::term::TermQuery;
    use crate::query::test_support::{analyzed, snapshot};
    use crate::schema::{Mapping, ObjectMapping};

    fn connection(user_id: &str, kind: &str) -> Document {
        Document::builder()
            .add_text("userId", user_id)
            .add_text("type", kind)
            .build()
    }

    fn profiles(connections: Vec<Document>) -> IndexSnapshot {
        let mut mappings = MappingSet::new();
        mappings
            .declare(
                Mapping::builder("profile")
                    .text("name")
                    .nested(
                        "connections",
                        ObjectMapping::new().keyword("userId").text("type").nested(
                            "tags",
                            ObjectMapping::new().keyword("label"),
                        ),
                    )
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let doc = Document::builder()
            .add_text("name", "Frederic")
            .add_nested("connections", connections)
            .build();
        let doc = analyzed(&mappings, "profile", "1", None, doc, 1);
        snapshot(mappings, vec![doc])
    }

    fn user_and_type(user_id: &str, kind: &str) -> NestedQuery {
        NestedQuery::new(
            "connections",
            Box::new(BooleanQuery::all_of(vec![
                Box::new(TermQuery::new("connections.userId", user_id)),
                Box::new(TermQuery::new("connections.type", kind)),
            ])),
        )
    }

    fn matches(snapshot: &IndexSnapshot, query: &dyn Query) -> bool {
        let doc = snapshot.get("profile", "1").unwrap();
        query.matches(&MatchContext::new(snapshot, doc)).unwrap()
    }

    #[test]
    fn test_single_object_semantics() {
        let snapshot = profiles(vec![
            connection("BCH", "Validated"),
            connection("TCL", "Pending"),
        ]);

        assert!(matches(&snapshot, &user_and_type("BCH", "validated")));
        assert!(matches(&snapshot, &user_and_type("TCL", "pending")));
        assert!(!matches(&snapshot, &user_and_type("BCH", "pending")));
    }

    #[test]
    fn test_no_objects_never_match() {
        let snapshot = profiles(vec![]);
        assert!(!matches(&snapshot, &user_and_type("BCH", "validated")));
        assert!(!matches(
            &snapshot,
            &NestedQuery::new("connections", Box::new(BooleanQuery::new()))
        ));
    }

    #[test]
    fn test_nested_terms_hidden_from_root() {
        let snapshot = profiles(vec![connection("BCH", "Validated")]);
        assert!(!matches(&snapshot, &TermQuery::new("connections.userId", "BCH")));
    }

    #[test]
    fn test_multi_level_nesting() {
        let tagged = Document::builder()
            .add_text("userId", "BCH")
            .add_nested(
                "tags",
                vec![Document::builder().add_text("label", "friend").build()],
            )
            .build();
        let snapshot = profiles(vec![connection("TCL", "Pending"), tagged]);

        let inner = NestedQuery::new(
            "connections",
            Box::new(BooleanQuery::all_of(vec![
                Box::new(TermQuery::new("connections.userId", "BCH")),
                Box::new(NestedQuery::new(
                    "connections.tags",
                    Box::new(TermQuery::new("connections.tags.label", "friend")),
                )),
            ])),
        );
        assert!(matches(&snapshot, &inner));

        let direct = NestedQuery::new(
            "connections.tags",
            Box::new(TermQuery::new("connections.tags.label", "friend")),
        );
        assert!(matches(&snapshot, &direct));
    }

    #[test]
    fn test_validate_unknown_path() {
        let snapshot = profiles(vec![]);
        let query = NestedQuery::new("friends", Box::new(BooleanQuery::new()));
        assert!(query.validate(snapshot.mappings()).is_err());
        assert!(user_and_type("BCH", "x").validate(snapshot.mappings()).is_ok());
    }
}
