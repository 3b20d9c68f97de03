//! Utility modules for Kindred.

pub mod levenshtein;
