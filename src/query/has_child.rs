//! Join queries from parents to their children.

use std::any::Any;

use crate::error::{KindredError, Result};
use crate::query::context::MatchContext;
use crate::query::query::Query;
use crate::schema::MappingSet;

/// A query that matches a parent document when at least one of its committed
/// children of `child_type` satisfies the inner query.
///
/// Children are found through the parent identifier they carry. A child whose
/// parent does not exist never makes anything match.
#[derive(Debug, Clone)]
pub struct HasChildQuery {
    child_type: String,
    query: Box<dyn Query>,
}

impl HasChildQuery {
    /// Create a new has-child query.
    pub fn new<T: Into<String>>(child_type: T, query: Box<dyn Query>) -> Self {
        HasChildQuery {
            child_type: child_type.into(),
            query,
        }
    }

    /// Get the child type.
    pub fn child_type(&self) -> &str {
        &self.child_type
    }

    /// Get the query the children are matched against.
    pub fn query(&self) -> &dyn Query {
        self.query.as_ref()
    }
}

impl Query for HasChildQuery {
    fn matches(&self, ctx: &MatchContext<'_>) -> Result<bool> {
        let parent = ctx.document();
        let snapshot = ctx.snapshot();

        let is_parent_type = snapshot
            .mappings()
            .get(&self.child_type)
            .and_then(|mapping| mapping.parent_type())
            == Some(parent.doc_type.as_str());
        if !is_parent_type {
            return Ok(false);
        }

        for child in snapshot.children(&self.child_type, &parent.id) {
            if self.query.matches(&ctx.with_document(child))? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn validate(&self, mappings: &MappingSet) -> Result<()> {
        let mapping = mappings.get(&self.child_type).ok_or_else(|| {
            KindredError::query(format!(
                "[has_child] no mapping for type [{}]",
                self.child_type
            ))
        })?;
        if mapping.parent_type().is_none() {
            return Err(KindredError::query(format!(
                "[has_child] type [{}] has no _parent mapping",
                self.child_type
            )));
        }
        self.query.validate(mappings)
    }

    fn description(&self) -> String {
        format!("has_child({}, {})", self.child_type, self.query.description())
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
    use crate::query::test_support::{analyzed, parent_child_mappings, snapshot};

    fn connection(sender: &str, receiver: &str) -> Document {
        Document::builder()
            .add_text("sender", sender)
            .add_text("receiver", receiver)
            .build()
    }

    fn sent_or_received(user: &str) -> HasChildQuery {
        HasChildQuery::new(
            "connection",
            Box::new(BooleanQuery::any_of(vec![
                Box::new(TermQuery::new("sender", user)),
                Box::new(TermQuery::new("receiver", user)),
            ])),
        )
    }

    fn matches(snapshot: &IndexSnapshot, id: &str, query: &dyn Query) -> bool {
        let doc = snapshot.get("profile", id).unwrap();
        query.matches(&MatchContext::new(snapshot, doc)).unwrap()
    }

    fn network() -> IndexSnapshot {
        let mappings = parent_child_mappings();
        let profile = |id: &str, seq| {
            let doc = Document::builder().add_text("name", id).build();
            analyzed(&mappings, "profile", id, None, doc, seq)
        };
        let docs = vec![
            profile("Frederic", 1),
            profile("Philippe", 2),
            profile("Thibault", 3),
            profile("Lonely", 4),
            analyzed(&mappings, "connection", "c1", Some("Frederic"), connection("BCH", "PAR"), 5),
            analyzed(&mappings, "connection", "c2", Some("Philippe"), connection("BCH", "FDR"), 6),
            analyzed(&mappings, "connection", "c3", Some("Thibault"), connection("PAR", "FDR"), 7),
            analyzed(&mappings, "connection", "c4", Some("Nobody"), connection("BCH", "BCH"), 8),
        ];
        snapshot(mappings, docs)
    }

    #[test]
    fn test_has_child_matches_any_child() {
        let snapshot = network();
        let query = sent_or_received("BCH");

        assert!(matches(&snapshot, "Frederic", &query));
        assert!(matches(&snapshot, "Philippe", &query));
        assert!(!matches(&snapshot, "Thibault", &query));
        assert!(!matches(&snapshot, "Lonely", &query));
    }

    #[test]
    fn test_orphans_are_ignored() {
        let snapshot = network();
        assert_eq!(snapshot.children("connection", "Nobody").count(), 1);
        assert!(snapshot.get("profile", "Nobody").is_none());
    }

    #[test]
    fn test_validate_requires_child_mapping() {
        let mappings = parent_child_mappings();
        assert!(sent_or_received("BCH").validate(&mappings).is_ok());
        assert!(HasChildQuery::new("profile", Box::new(BooleanQuery::new()))
            .validate(&mappings)
            .is_err());
        assert!(HasChildQuery::new("missing", Box::new(BooleanQuery::new()))
            .validate(&mappings)
            .is_err());
    }
}
