//! Analyzers combine a tokenizer with token normalization.
//!
//! - [`StandardAnalyzer`] - Unicode word tokenization plus lowercasing, used
//!   for analyzed `text` fields
//! - [`KeywordAnalyzer`] - the whole value as one untouched term, used for
//!   exact-match `keyword` fields

use std::sync::Arc;

use crate::analysis::token::TokenStream;
use crate::analysis::tokenizer::{Tokenizer, UnicodeWordTokenizer, WholeTokenizer};
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
///
/// The trait requires `Send + Sync` so analyzers can be shared between
/// concurrent writers and searchers.
pub trait Analyzer: Send + Sync + std::fmt::Debug {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;

    /// Get this analyzer as Any for downcasting.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Analyze the text and collect the token texts.
    fn terms(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.analyze(text)?.map(|token| token.text).collect())
    }
}

/// A standard analyzer: Unicode word boundaries and lowercase normalization.
///
/// ```
/// use kindred::analysis::analyzer::{Analyzer, StandardAnalyzer};
///
/// let analyzer = StandardAnalyzer::new();
/// assert_eq!(analyzer.terms("Frederic Dupont").unwrap(), vec!["frederic", "dupont"]);
/// ```
#[derive(Debug, Clone)]
pub struct StandardAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
}

impl StandardAnalyzer {
    /// Create a new standard analyzer.
    pub fn new() -> Self {
        StandardAnalyzer {
            tokenizer: Arc::new(UnicodeWordTokenizer::new()),
        }
    }
}

impl Default for StandardAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        let tokens = self.tokenizer.tokenize(text)?;
        Ok(Box::new(tokens.map(|token| {
            let lowered = token.text.to_lowercase();
            token.with_text(lowered)
        })))
    }

    fn name(&self) -> &'static str {
        "standard"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// A keyword analyzer that treats the entire input as a single token.
#[derive(Debug, Clone)]
pub struct KeywordAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
}

impl KeywordAnalyzer {
    /// Create a new keyword analyzer.
    pub fn new() -> Self {
        KeywordAnalyzer {
            tokenizer: Arc::new(WholeTokenizer::new()),
        }
    }
}

impl Default for KeywordAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for KeywordAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        self.tokenizer.tokenize(text)
    }

    fn name(&self) -> &'static str {
        "keyword"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
