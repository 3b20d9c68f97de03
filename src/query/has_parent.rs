//! Join queries from children to their parent.

use std::any::Any;

use crate::error::{KindredError, Result};
use crate::query::context::MatchContext;
use crate::query::query::Query;
use crate::schema::MappingSet;

/// A query that matches a child document when its committed parent of
/// `parent_type` satisfies the inner query.
#[derive(Debug, Clone)]
pub struct HasParentQuery {
    parent_type: String,
    query: Box<dyn Query>,
}

impl HasParentQuery {
    /// Create a new has-parent query.
    pub fn new<T: Into<String>>(parent_type: T, query: Box<dyn Query>) -> Self {
        HasParentQuery {
            parent_type: parent_type.into(),
            query,
        }
    }

    /// Get the parent type.
    pub fn parent_type(&self) -> &str {
        &self.parent_type
    }
}

impl Query for HasParentQuery {
    fn matches(&self, ctx: &MatchContext<'_>) -> Result<bool> {
        let child = ctx.document();
        let snapshot = ctx.snapshot();

        let Some(parent_id) = child.parent.as_deref() else {
            return Ok(false);
        };
        let declared = snapshot
            .mappings()
            .get(&child.doc_type)
            .and_then(|mapping| mapping.parent_type());
        if declared != Some(self.parent_type.as_str()) {
            return Ok(false);
        }

        match snapshot.get(&self.parent_type, parent_id) {
            Some(parent) => self.query.matches(&ctx.with_document(parent)),
            None => Ok(false),
        }
    }

    fn validate(&self, mappings: &MappingSet) -> Result<()> {
        if mappings.child_types(&self.parent_type).is_empty() {
            return Err(KindredError::query(format!(
                "[has_parent] no child type declares [{}] as its parent",
                self.parent_type
            )));
        }
        self.query.validate(mappings)
    }

    fn description(&self) -> String {
        format!("has_parent({}, {})", self.parent_type, self.query.description())
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
    use crate::query::term::TermQuery;
    use crate::query::test_support::{analyzed, parent_child_mappings, snapshot};

    #[test]
    fn test_has_parent() {
        let mappings = parent_child_mappings();
        let frederic = Document::builder().add_text("name", "Frederic").build();
        let link = Document::builder().add_text("sender", "BCH").build();
        let docs = vec![
            analyzed(&mappings, "profile", "1", None, frederic, 1),
            analyzed(&mappings, "connection", "c1", Some("1"), link.clone(), 2),
            analyzed(&mappings, "connection", "c2", Some("404"), link, 3),
        ];
        let snapshot = snapshot(mappings, docs);

        let query = HasParentQuery::new("profile", Box::new(TermQuery::new("name", "frederic")));
        let child = snapshot.get("connection", "c1").unwrap();
        assert!(query.matches(&MatchContext::new(&snapshot, child)).unwrap());

        let orphan = snapshot.get("connection", "c2").unwrap();
        assert!(!query.matches(&MatchContext::new(&snapshot, orphan)).unwrap());

        let profile = snapshot.get("profile", "1").unwrap();
        assert!(!query.matches(&MatchContext::new(&snapshot, profile)).unwrap());
    }

    #[test]
    fn test_validate_requires_parent_link() {
        let mappings = parent_child_mappings();
        let inner = || Box::new(TermQuery::new("name", "x")) as Box<dyn Query>;
        assert!(HasParentQuery::new("profile", inner()).validate(&mappings).is_ok());
        assert!(HasParentQuery::new("connection", inner()).validate(&mappings).is_err());
    }
}
