//! Search responses.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use crate::document::{AnalyzedDocument, Document, JsonDocumentConverter};

/// One matching document.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Document identifier.
    pub id: String,
    /// Document type.
    pub doc_type: String,
    /// Parent identifier, for child documents.
    pub parent: Option<String>,
    /// Write sequence number.
    pub seq_no: u64,
    /// Document source.
    pub source: Arc<Document>,
}

impl From<&AnalyzedDocument> for SearchHit {
    fn from(doc: &AnalyzedDocument) -> Self {
        SearchHit {
            id: doc.id.clone(),
            doc_type: doc.doc_type.clone(),
            parent: doc.parent.clone(),
            seq_no: doc.seq_no,
            source: Arc::clone(&doc.source),
        }
    }
}

/// The result of a search.
#[derive(Debug, Clone, Default)]
pub struct SearchResponse {
    /// Number of matching documents, regardless of paging.
    pub total_hits: u64,
    /// The requested page of hits.
    pub hits: Vec<SearchHit>,
    /// Time spent searching.
    pub took: Duration,
    /// Generation of the snapshot that was searched.
    pub generation: u64,
}

impl SearchResponse {
    /// Get the identifiers of the returned hits.
    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.id.as_str()).collect()
    }

    /// Render the response as JSON.
    pub fn to_json(&self) -> Value {
        let converter = JsonDocumentConverter::new();
        let hits: Vec<Value> = self
            .hits
            .iter()
            .map(|hit| {
                let mut value = json!({
                    "_id": hit.id,
                    "_type": hit.doc_type,
                    "_source": converter.to_json(&hit.source),
                });
                if let Some(parent) = &hit.parent {
                    value["_parent"] = json!(parent);
                }
                value
            })
            .collect();

        json!({
            "took": self.took.as_millis() as u64,
            "generation": self.generation,
            "hits": {
                "total": self.total_hits,
                "hits": hits,
            }
        })
    }
}
