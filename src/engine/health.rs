//! Health and readiness reporting.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Overall engine health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every write has been committed and storage is reachable.
    Green,
    /// Writes are waiting for a commit.
    Yellow,
    /// Storage is unreachable; commits will fail.
    Red,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Green => write!(f, "green"),
            HealthStatus::Yellow => write!(f, "yellow"),
            HealthStatus::Red => write!(f, "red"),
        }
    }
}

/// Health of one collection.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionHealth {
    /// Collection name.
    pub name: String,
    /// Mapped document types.
    pub types: Vec<String>,
    /// Committed documents.
    pub documents: usize,
    /// Buffered writes not yet committed.
    pub pending_writes: usize,
    /// Generation of the committed snapshot.
    pub generation: u64,
}

/// A point-in-time health report.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall status.
    pub status: HealthStatus,
    /// Per-collection details, by name.
    pub collections: Vec<CollectionHealth>,
    /// Why storage is unreachable, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<String>,
    /// When the engine was opened.
    pub started_at: DateTime<Utc>,
    /// When the report was taken.
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    /// Whether the engine can serve reads and writes.
    pub fn is_ready(&self) -> bool {
        self.status != HealthStatus::Red
    }

    /// Count committed documents across collections.
    pub fn documents(&self) -> usize {
        self.collections.iter().map(|c| c.documents).sum()
    }

    /// Count buffered writes across collections.
    pub fn pending_writes(&self) -> usize {
        self.collections.iter().map(|c| c.pending_writes).sum()
    }
}
