//! Query evaluation over a committed snapshot.

use std::sync::Arc;
use std::time::Instant;

use log::debug;
use rayon::prelude::*;

use crate::document::AnalyzedDocument;
use crate::error::Result;
use crate::index::snapshot::IndexSnapshot;
use crate::query::MatchContext;
use crate::search::request::SearchRequest;
use crate::search::response::{SearchHit, SearchResponse};

/// Evaluates search requests against one snapshot.
///
/// Every candidate document is checked against the query and the post-filter.
/// From `parallel_threshold` candidates on, documents are checked on the
/// rayon thread pool.
#[derive(Debug, Clone)]
pub struct Searcher {
    snapshot: Arc<IndexSnapshot>,
    parallel_threshold: usize,
}

impl Searcher {
    /// Create a searcher over a snapshot.
    pub fn new(snapshot: Arc<IndexSnapshot>) -> Self {
        Searcher {
            snapshot,
            parallel_threshold: 1024,
        }
    }

    /// Set the candidate count from which evaluation runs in parallel.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold.max(1);
        self
    }

    /// Get the snapshot being searched.
    pub fn snapshot(&self) -> &IndexSnapshot {
        &self.snapshot
    }

    fn accept(&self, doc: &AnalyzedDocument, request: &SearchRequest) -> Result<bool> {
        let ctx = MatchContext::new(&self.snapshot, doc);
        if !request.query().matches(&ctx)? {
            return Ok(false);
        }
        match request.post_filter() {
            Some(filter) => filter.matches(&ctx),
            None => Ok(true),
        }
    }

    /// Run a search.
    ///
    /// The request is assumed to be validated against the collection's
    /// mappings.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let start = Instant::now();
        let candidates = self.snapshot.documents_of(request.doc_types());
        let candidate_count = candidates.len();

        let matched: Vec<&Arc<AnalyzedDocument>> = if candidate_count >= self.parallel_threshold {
            candidates
                .into_par_iter()
                .filter_map(|doc| match self.accept(doc, request) {
                    Ok(true) => Some(Ok(doc)),
                    Ok(false) => None,
                    Err(e) => Some(Err(e)),
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            let mut matched = Vec::new();
            for doc in candidates {
                if self.accept(doc, request)? {
                    matched.push(doc);
                }
            }
            matched
        };

        let hits = matched
            .iter()
            .skip(request.from())
            .take(request.size())
            .map(|doc| SearchHit::from(doc.as_ref()))
            .collect();

        let response = SearchResponse {
            total_hits: matched.len() as u64,
            hits,
            took: start.elapsed(),
            generation: self.snapshot.generation(),
        };

        debug!(
            "Search {} (filter {}) matched {} of {} candidates at generation {} in {:?}",
            request.query().description(),
            request
                .post_filter()
                .map(|f| f.description())
                .unwrap_or_else(|| "none".to_string()),
            response.total_hits,
            candidate_count,
            response.generation,
            response.took
        );
        Ok(response)
    }
}
