//! Base query trait and common query functionality.

use std::any::Any;
use std::fmt::Debug;

use crate::error::Result;
use crate::query::context::MatchContext;
use crate::schema::MappingSet;

/// Trait for search queries and filters.
///
/// A query decides whether the object in scope matches. There is no scoring:
/// every query acts as a filter.
pub trait Query: Send + Sync + Debug {
    /// Check whether the object in scope matches this query.
    fn matches(&self, ctx: &MatchContext<'_>) -> Result<bool>;

    /// Check this query against the collection's mappings before it runs.
    ///
    /// The default accepts any mapping.
    fn validate(&self, _mappings: &MappingSet) -> Result<()> {
        Ok(())
    }

    /// Get a human-readable description of this query.
    fn description(&self) -> String;

    /// Clone this query.
    fn clone_box(&self) -> Box<dyn Query>;

    /// Get this query as Any for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn Query> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
