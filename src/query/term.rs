//! Term query implementation for exact term matching.

use std::any::Any;

use crate::error::Result;
use crate::query::context::MatchContext;
use crate::query::query::Query;

/// A query that matches objects containing a specific term.
#[derive(Debug, Clone)]
pub struct TermQuery {
    /// The field to search in.
    field: String,
    /// The term to search for.
    term: String,
}

impl TermQuery {
    /// Create a new term query.
    ///
    /// The term is compared as is and is NOT analyzed. A keyword field holds its
    /// whole value as one term; a text field holds lowercased words, so a term
    /// query on text must be lowercased by the caller.
    pub fn new<F, T>(field: F, term: T) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        TermQuery {
            field: field.into(),
            term: term.into(),
        }
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the term.
    pub fn term(&self) -> &str {
        &self.term
    }
}

impl Query for TermQuery {
    fn matches(&self, ctx: &MatchContext<'_>) -> Result<bool> {
        Ok(ctx.terms(&self.field).iter().any(|t| *t == self.term))
    }

    fn description(&self) -> String {
        format!("{}:{}", self.field, self.term)
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
