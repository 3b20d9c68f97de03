//! Boolean query implementation for combining multiple queries.

use std::any::Any;

use crate::error::Result;
use crate::query::context::MatchContext;
use crate::query::query::Query;
use crate::schema::MappingSet;

/// Occurrence requirements for boolean clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// The clause must match (equivalent to AND).
    Must,
    /// The clause should match (equivalent to OR).
    Should,
    /// The clause must not match (equivalent to NOT).
    MustNot,
}

/// A clause in a boolean query.
#[derive(Debug)]
pub struct BooleanClause {
    /// The query for this clause.
    pub query: Box<dyn Query>,
    /// The occurrence requirement.
    pub occur: Occur,
}

impl Clone for BooleanClause {
    fn clone(&self) -> Self {
        BooleanClause {
            query: self.query.clone_box(),
            occur: self.occur,
        }
    }
}

impl BooleanClause {
    /// Create a new boolean clause.
    pub fn new(query: Box<dyn Query>, occur: Occur) -> Self {
        BooleanClause { query, occur }
    }

    /// Create a MUST clause.
    pub fn must(query: Box<dyn Query>) -> Self {
        BooleanClause::new(query, Occur::Must)
    }

    /// Create a SHOULD clause.
    pub fn should(query: Box<dyn Query>) -> Self {
        BooleanClause::new(query, Occur::Should)
    }

    /// Create a MUST_NOT clause.
    pub fn must_not(query: Box<dyn Query>) -> Self {
        BooleanClause::new(query, Occur::MustNot)
    }
}

/// A boolean query that combines multiple queries with boolean logic.
///
/// Without an explicit minimum, at least one SHOULD clause has to match when
/// the query has no MUST clause; with MUST clauses the SHOULD clauses are
/// optional. A query without clauses matches everything.
#[derive(Debug, Clone, Default)]
pub struct BooleanQuery {
    /// The clauses in this boolean query.
    clauses: Vec<BooleanClause>,
    /// Minimum number of should clauses that must match.
    minimum_should_match: Option<usize>,
}

impl BooleanQuery {
    /// Create a new empty boolean query.
    pub fn new() -> Self {
        BooleanQuery::default()
    }

    /// Create a disjunction: any of the queries has to match.
    pub fn any_of(queries: Vec<Box<dyn Query>>) -> Self {
        let mut query = BooleanQuery::new();
        for q in queries {
            query.add_should(q);
        }
        query
    }

    /// Create a conjunction: all of the queries have to match.
    pub fn all_of(queries: Vec<Box<dyn Query>>) -> Self {
        let mut query = BooleanQuery::new();
        for q in queries {
            query.add_must(q);
        }
        query
    }

    /// Add a clause to this boolean query.
    pub fn add_clause(&mut self, clause: BooleanClause) {
        self.clauses.push(clause);
    }

    /// Add a MUST clause.
    pub fn add_must(&mut self, query: Box<dyn Query>) {
        self.add_clause(BooleanClause::must(query));
    }

    /// Add a SHOULD clause.
    pub fn add_should(&mut self, query: Box<dyn Query>) {
        self.add_clause(BooleanClause::should(query));
    }

    /// Add a MUST_NOT clause.
    pub fn add_must_not(&mut self, query: Box<dyn Query>) {
        self.add_clause(BooleanClause::must_not(query));
    }

    /// Set the minimum number of should clauses that must match.
    pub fn with_minimum_should_match(mut self, minimum: usize) -> Self {
        self.minimum_should_match = Some(minimum);
        self
    }

    /// Get the clauses.
    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    /// Get the effective minimum number of SHOULD clauses that must match.
    pub fn minimum_should_match(&self) -> usize {
        match self.minimum_should_match {
            Some(minimum) => minimum,
            None if self.has_must() || self.should_count() == 0 => 0,
            None => 1,
        }
    }

    fn has_must(&self) -> bool {
        self.clauses.iter().any(|c| c.occur == Occur::Must)
    }

    fn should_count(&self) -> usize {
        self.clauses.iter().filter(|c| c.occur == Occur::Should).count()
    }
}

impl Query for BooleanQuery {
    fn matches(&self, ctx: &MatchContext<'_>) -> Result<bool> {
        // Cheap exclusions first.
        for clause in self.clauses.iter().filter(|c| c.occur == Occur::MustNot) {
            if clause.query.matches(ctx)? {
                return Ok(false);
            }
        }

        for clause in self.clauses.iter().filter(|c| c.occur == Occur::Must) {
            if !clause.query.matches(ctx)? {
                return Ok(false);
            }
        }

        let minimum = self.minimum_should_match();
        if minimum == 0 {
            return Ok(true);
        }

        let mut matched = 0;
        for clause in self.clauses.iter().filter(|c| c.occur == Occur::Should) {
            if clause.query.matches(ctx)? {
                matched += 1;
                if matched >= minimum {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn validate(&self, mappings: &MappingSet) -> Result<()> {
        self.clauses
            .iter()
            .try_for_each(|clause| clause.query.validate(mappings))
    }

    fn description(&self) -> String {
        if self.clauses.is_empty() {
            return "*:*".to_string();
        }

        let parts: Vec<String> = self
            .clauses
            .iter()
            .map(|clause| match clause.occur {
                Occur::Must => format!("+{}", clause.query.description()),
                Occur::Should => clause.query.description(),
                Occur::MustNot => format!("-{}", clause.query.description()),
            })
            .collect();
        format!("({})", parts.join(" "))
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A builder for constructing boolean queries in a fluent manner.
#[derive(Debug, Default)]
pub struct BooleanQueryBuilder {
    query: BooleanQuery,
}

impl BooleanQueryBuilder {
    /// Create a new boolean query builder.
    pub fn new() -> Self {
        BooleanQueryBuilder::default()
    }

    /// Add a MUST clause.
    pub fn must(mut self, query: Box<dyn Query>) -> Self {
        self.query.add_must(query);
        self
    }

    /// Add a SHOULD clause.
    pub fn should(mut self, query: Box<dyn Query>) -> Self {
        self.query.add_should(query);
        self
    }

    /// Add a MUST_NOT clause.
    pub fn must_not(mut self, query: Box<dyn Query>) -> Self {
        self.query.add_must_not(query);
        self
    }

    /// Set the minimum number of should clauses that must match.
    pub fn minimum_should_match(mut self, minimum: usize) -> Self {
        self.query = self.query.with_minimum_should_match(minimum);
        self
    }

    /// Build the boolean query.
    pub fn build(self) -> BooleanQuery {
        self.query
    }
}
