//! Fuzzy query implementation for approximate string matching.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{KindredError, Result};
use crate::query::context::MatchContext;
use crate::query::query::Query;
use crate::util::levenshtein::edit_distance_within;

/// The number of edits a fuzzy query tolerates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fuzziness {
    /// Derived from the term length: exact up to 2 characters, one edit up to
    /// 5, two edits above.
    #[default]
    Auto,
    /// A fixed maximum edit distance.
    Edits(u32),
}

impl Fuzziness {
    /// Get the maximum edit distance allowed for a (normalized) term.
    pub fn max_edits(&self, term: &str) -> usize {
        match self {
            Fuzziness::Auto => match term.chars().count() {
                0..=2 => 0,
                3..=5 => 1,
                _ => 2,
            },
            Fuzziness::Edits(edits) => *edits as usize,
        }
    }

    /// Parse `"AUTO"`, a number, or a number in a string.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Fuzziness::Edits)
                .ok_or_else(|| KindredError::query(format!("invalid fuzziness {n}"))),
            serde_json::Value::String(s) if s.eq_ignore_ascii_case("auto") => {
                Ok(Fuzziness::Auto)
            }
            serde_json::Value::String(s) => s
                .parse::<u32>()
                .map(Fuzziness::Edits)
                .map_err(|_| KindredError::query(format!("invalid fuzziness '{s}'"))),
            other => Err(KindredError::query(format!("invalid fuzziness {other}"))),
        }
    }
}

impl fmt::Display for Fuzziness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fuzziness::Auto => write!(f, "AUTO"),
            Fuzziness::Edits(n) => write!(f, "{n}"),
        }
    }
}

/// A fuzzy query for approximate string matching.
///
/// The query term is normalized with the analyzer of the target field, so
/// `"Frdeeric"` finds the text term `frederic` one transposition away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyQuery {
    /// Field to search in
    field: String,
    /// Term to search for
    term: String,
    /// Maximum edit distance
    fuzziness: Fuzziness,
    /// Minimum prefix length that must match exactly
    prefix_length: usize,
    /// Whether transpositions count as single edits (Damerau-Levenshtein)
    transpositions: bool,
}

impl FuzzyQuery {
    /// Create a new fuzzy query with automatic fuzziness.
    pub fn new<F: Into<String>, T: Into<String>>(field: F, term: T) -> Self {
        FuzzyQuery {
            field: field.into(),
            term: term.into(),
            fuzziness: Fuzziness::Auto,
            prefix_length: 0,
            transpositions: true,
        }
    }

    /// Set the fuzziness.
    pub fn fuzziness(mut self, fuzziness: Fuzziness) -> Self {
        self.fuzziness = fuzziness;
        self
    }

    /// Set a fixed maximum edit distance.
    pub fn max_edits(self, max_edits: u32) -> Self {
        self.fuzziness(Fuzziness::Edits(max_edits))
    }

    /// Set the minimum prefix length that must match exactly.
    pub fn prefix_length(mut self, prefix_length: usize) -> Self {
        self.prefix_length = prefix_length;
        self
    }

    /// Set whether transpositions should be considered single edits.
    pub fn transpositions(mut self, transpositions: bool) -> Self {
        self.transpositions = transpositions;
        self
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the search term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Get the fuzziness.
    pub fn get_fuzziness(&self) -> Fuzziness {
        self.fuzziness
    }

    /// Get the prefix length.
    pub fn get_prefix_length(&self) -> usize {
        self.prefix_length
    }

    /// Check if transpositions are enabled.
    pub fn get_transpositions(&self) -> bool {
        self.transpositions
    }

    /// Normalize the query term the way the field's values were indexed.
    ///
    /// Returns `None` when the analyzer produces no token.
    fn normalized_term(&self, ctx: &MatchContext<'_>) -> Result<Option<String>> {
        match ctx.field_mapping(&self.field).and_then(|m| m.analyzer()) {
            Some(analyzer) => Ok(analyzer.terms(&self.term)?.into_iter().next()),
            None => Ok(Some(self.term.clone())),
        }
    }

    fn prefix_matches(&self, candidate: &str, term: &str) -> bool {
        self.prefix_length == 0
            || candidate
                .chars()
                .take(self.prefix_length)
                .eq(term.chars().take(self.prefix_length))
    }
}

impl Query for FuzzyQuery {
    fn matches(&self, ctx: &MatchContext<'_>) -> Result<bool> {
        let candidates = ctx.terms(&self.field);
        if candidates.is_empty() {
            return Ok(false);
        }

        let Some(term) = self.normalized_term(ctx)? else {
            return Ok(false);
        };
        let max_edits = self.fuzziness.max_edits(&term);

        Ok(candidates.iter().any(|candidate| {
            self.prefix_matches(candidate, &term)
                && edit_distance_within(candidate, &term, max_edits, self.transpositions).is_some()
        }))
    }

    fn description(&self) -> String {
        format!("{}:{}~{}", self.field, self.term, self.fuzziness)
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
