//! Query that matches every object in scope.

use std::any::Any;

use crate::error::Result;
use crate::query::context::MatchContext;
use crate::query::query::Query;

/// A query that matches everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchAllQuery;

impl MatchAllQuery {
    /// Create a new match-all query.
    pub fn new() -> Self {
        MatchAllQuery
    }
}

impl Query for MatchAllQuery {
    fn matches(&self, _ctx: &MatchContext<'_>) -> Result<bool> {
        Ok(true)
    }

    fn description(&self) -> String {
        "*:*".to_string()
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
