//! Bulk ingestion.
//!
//! A bulk request carries many writes. Each is validated on its own; the
//! failed ones are reported by position and the valid ones are buffered as a
//! single batch, so they become visible together at the next commit.
//!
//! Requests can be read from the newline-delimited form a bulk
//! endpoint accepts:
//!
//! ```text
//! {"index": {"_type": "profile", "_id": "1"}}
//! {"name": "Frederic"}
//! {"index": {"_type": "connection", "_parent": "1"}}
//! {"sender": "BCH", "receiver": "PAR"}
//! {"delete": {"_type": "connection", "_id": "c9"}}
//! ```

use std::time::Duration;

use serde_json::Value;

use crate::document::{Document, JsonDocumentConverter};
use crate::error::{KindredError, Result};

/// One write of a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOperation {
    /// Add or replace a document. A missing id is generated.
    Index {
        /// Document type.
        doc_type: String,
        /// Document identifier.
        id: Option<String>,
        /// Parent identifier, for child types.
        parent: Option<String>,
        /// Document source.
        source: Document,
    },
    /// Remove a document.
    Delete {
        /// Document type.
        doc_type: String,
        /// Document identifier.
        id: String,
    },
    /// An index action whose source could not be read. It is reported as a
    /// failed item and never buffered.
    Invalid {
        /// Document type.
        doc_type: String,
        /// Document identifier, when the action named one.
        id: Option<String>,
        /// Why the source was rejected.
        reason: String,
    },
}

impl BulkOperation {
    /// Get the action name, as used in the newline-delimited form.
    pub fn action(&self) -> &'static str {
        match self {
            BulkOperation::Index { .. } | BulkOperation::Invalid { .. } => "index",
            BulkOperation::Delete { .. } => "delete",
        }
    }

    /// Get the document type.
    pub fn doc_type(&self) -> &str {
        match self {
            BulkOperation::Index { doc_type, .. }
            | BulkOperation::Delete { doc_type, .. }
            | BulkOperation::Invalid { doc_type, .. } => doc_type,
        }
    }
}

/// An ordered list of writes submitted together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkRequest {
    operations: Vec<BulkOperation>,
}

impl BulkRequest {
    /// Create an empty bulk request.
    pub fn new() -> Self {
        BulkRequest::default()
    }

    /// Add a document with a known id.
    pub fn index<T: Into<String>, I: Into<String>>(self, doc_type: T, id: I, source: Document) -> Self {
        self.add(BulkOperation::Index {
            doc_type: doc_type.into(),
            id: Some(id.into()),
            parent: None,
            source,
        })
    }

    /// Add a child document; `id` is generated when `None`.
    pub fn index_child<T: Into<String>, P: Into<String>>(
        self,
        doc_type: T,
        id: Option<String>,
        parent: P,
        source: Document,
    ) -> Self {
        self.add(BulkOperation::Index {
            doc_type: doc_type.into(),
            id,
            parent: Some(parent.into()),
            source,
        })
    }

    /// Add a delete.
    pub fn delete<T: Into<String>, I: Into<String>>(self, doc_type: T, id: I) -> Self {
        self.add(BulkOperation::Delete {
            doc_type: doc_type.into(),
            id: id.into(),
        })
    }

    /// Add any operation.
    pub fn add(mut self, operation: BulkOperation) -> Self {
        self.push(operation);
        self
    }

    /// Append an operation in place.
    pub fn push(&mut self, operation: BulkOperation) {
        self.operations.push(operation);
    }

    /// Get the operations.
    pub fn operations(&self) -> &[BulkOperation] {
        &self.operations
    }

    /// Take the operations out of the request.
    pub fn into_operations(self) -> Vec<BulkOperation> {
        self.operations
    }

    /// Get the number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the request has no operation.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Parse the newline-delimited bulk form.
    ///
    /// Blank lines are skipped. Action metadata accepts `_type`/`type`,
    /// `_id`/`id` and `_parent`/`parent`. Only `index` and `delete` actions
    /// are accepted.
    ///
    /// Lines that cannot be framed into actions fail the whole request. A
    /// source line that frames but is not a valid document becomes an
    /// [`BulkOperation::Invalid`] item, so the other items still go through.
    pub fn from_ndjson(input: &str) -> Result<Self> {
        let converter = JsonDocumentConverter::new();
        let mut request = BulkRequest::new();
        let mut lines = input
            .lines()
            .enumerate()
            .map(|(n, line)| (n + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        while let Some((number, line)) = lines.next() {
            let action: Value = serde_json::from_str(line).map_err(|e| {
                KindredError::validation(format!("bulk line {number}: invalid JSON: {e}"))
            })?;
            let (name, meta) = action
                .as_object()
                .filter(|object| object.len() == 1)
                .and_then(|object| object.iter().next())
                .ok_or_else(|| {
                    KindredError::validation(format!(
                        "bulk line {number}: expected one action object"
                    ))
                })?;

            let doc_type = meta_str(meta, &["_type", "type"]).ok_or_else(|| {
                KindredError::validation(format!("bulk line {number}: missing _type"))
            })?;
            let id = meta_str(meta, &["_id", "id"]);

            match name.as_str() {
                "index" => {
                    let (source_number, source) = lines.next().ok_or_else(|| {
                        KindredError::validation(format!(
                            "bulk line {number}: index action without a source line"
                        ))
                    })?;
                    match converter.convert_str(source) {
                        Ok(source) => request.push(BulkOperation::Index {
                            doc_type,
                            id,
                            parent: meta_str(meta, &["_parent", "parent"]),
                            source,
                        }),
                        Err(e) => request.push(BulkOperation::Invalid {
                            doc_type,
                            id,
                            reason: format!("bulk line {source_number}: {e}"),
                        }),
                    }
                }
                "delete" => {
                    let id = id.ok_or_else(|| {
                        KindredError::validation(format!("bulk line {number}: delete needs an _id"))
                    })?;
                    request.push(BulkOperation::Delete { doc_type, id });
                }
                other => {
                    return Err(KindredError::validation(format!(
                        "bulk line {number}: unknown action '{other}'"
                    )));
                }
            }
        }

        Ok(request)
    }
}

fn meta_str(meta: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match meta.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// The outcome of one bulk operation.
#[derive(Debug)]
pub struct BulkItemResponse {
    /// Position of the operation in the request.
    pub position: usize,
    /// `index` or `delete`.
    pub action: &'static str,
    /// Document type.
    pub doc_type: String,
    /// Document identifier, generated ones included; `None` when the
    /// operation failed before an id was assigned.
    pub id: Option<String>,
    /// Why the operation was rejected.
    pub error: Option<KindredError>,
}

impl BulkItemResponse {
    /// Whether the operation was rejected.
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// The outcome of a bulk request.
#[derive(Debug, Default)]
pub struct BulkResponse {
    /// One entry per operation, in request order.
    pub items: Vec<BulkItemResponse>,
    /// Time spent validating and buffering.
    pub took: Duration,
}

impl BulkResponse {
    /// Whether any operation was rejected.
    pub fn has_failures(&self) -> bool {
        self.items.iter().any(BulkItemResponse::is_failed)
    }

    /// Iterate over the rejected operations.
    pub fn failures(&self) -> impl Iterator<Item = &BulkItemResponse> {
        self.items.iter().filter(|item| item.is_failed())
    }

    /// Count the accepted operations.
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| !item.is_failed()).count()
    }

    /// Summarize the rejected operations in one message.
    pub fn failure_message(&self) -> String {
        self.failures()
            .map(|item| {
                let reason = item.error.as_ref().map(ToString::to_string).unwrap_or_default();
                format!("[{}]: {}", item.position, reason)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
