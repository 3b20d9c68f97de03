//! Text analysis for Kindred.
//!
//! Analyzers turn string field values into the terms stored in the index.
//! Exact-match (`keyword`) fields keep the whole value as one term; analyzed
//! (`text`) fields are split on Unicode word boundaries and lowercased.

pub mod analyzer;
pub mod token;
pub mod tokenizer;

pub use analyzer::{Analyzer, KeywordAnalyzer, StandardAnalyzer};
pub use token::{Token, TokenStream};
pub use tokenizer::{Tokenizer, UnicodeWordTokenizer, WholeTokenizer};
