//! Search requests, responses and their evaluation.

pub mod request;
pub mod response;
pub mod searcher;

pub use request::SearchRequest;
pub use response::{SearchHit, SearchResponse};
pub use searcher::Searcher;
