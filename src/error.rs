//! Error types for the Kindred library.
//!
//! All fallible operations return [`KindredError`] through the crate-wide
//! [`Result`] alias. The variants follow the failure classes a caller has to
//! tell apart: a mapping that conflicts with an earlier declaration, a
//! document that does not fit its mapping, a missing collection or type, and
//! a malformed query.
//!
//! # Examples
//!
//! ```
//! use kindred::error::{KindredError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(KindredError::validation("field 'name' expects a string"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Kindred operations.
#[derive(Error, Debug)]
pub enum KindredError {
    /// A mapping was redeclared with an incompatible schema.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A field value does not conform to its declared kind.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A collection, document type or document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Query-related errors (malformed DSL, unknown query kinds).
    #[error("Query error: {0}")]
    Query(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with KindredError.
pub type Result<T> = std::result::Result<T, KindredError>;

impl KindredError {
    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        KindredError::Configuration(msg.into())
    }

    /// Create a new validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        KindredError::Validation(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        KindredError::NotFound(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        KindredError::Query(msg.into())
    }

    /// Create a new parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        KindredError::Query(msg.into()) // Parse errors are treated as query errors
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        KindredError::Storage(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        KindredError::Other(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        KindredError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Whether this error rejects a single document rather than the request.
    pub fn is_validation(&self) -> bool {
        matches!(self, KindredError::Validation(_))
    }

    /// Whether this error reports a missing collection, type or document.
    pub fn is_not_found(&self) -> bool {
        matches!(self, KindredError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = KindredError::configuration("field 'name' changed kind");
        assert_eq!(
            error.to_string(),
            "Configuration error: field 'name' changed kind"
        );

        let error = KindredError::validation("bad value");
        assert_eq!(error.to_string(), "Validation error: bad value");
        assert!(error.is_validation());

        let error = KindredError::not_found("collection 'connections'");
        assert_eq!(error.to_string(), "Not found: collection 'connections'");
        assert!(error.is_not_found());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let kindred_error = KindredError::from(io_error);

        match kindred_error {
            KindredError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
