//! Search requests.

use serde_json::Value;

use crate::error::{KindredError, Result};
use crate::query::{MatchAllQuery, Query, QueryParser};
use crate::schema::MappingSet;

/// A search over the committed documents of one collection.
///
/// Both the query and the post-filter must match a document for it to be a
/// hit. Hits come back in write order.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    doc_types: Vec<String>,
    query: Box<dyn Query>,
    post_filter: Option<Box<dyn Query>>,
    from: usize,
    size: usize,
}

impl SearchRequest {
    /// Number of hits returned when the request does not set a size.
    pub const DEFAULT_SIZE: usize = 10;

    /// Create a request over every type of the collection.
    pub fn new(query: Box<dyn Query>) -> Self {
        SearchRequest {
            doc_types: Vec::new(),
            query,
            post_filter: None,
            from: 0,
            size: Self::DEFAULT_SIZE,
        }
    }

    /// Create a request matching every document.
    pub fn match_all() -> Self {
        SearchRequest::new(Box::new(MatchAllQuery::new()))
    }

    /// Restrict the search to some document types.
    pub fn with_types(mut self, doc_types: Vec<String>) -> Self {
        self.doc_types = doc_types;
        self
    }

    /// Restrict the search to one document type.
    pub fn with_type<S: Into<String>>(self, doc_type: S) -> Self {
        self.with_types(vec![doc_type.into()])
    }

    /// Set the post-filter.
    pub fn with_post_filter(mut self, filter: Box<dyn Query>) -> Self {
        self.post_filter = Some(filter);
        self
    }

    /// Set the offset of the first hit returned.
    pub fn with_from(mut self, from: usize) -> Self {
        self.from = from;
        self
    }

    /// Set the number of hits returned. The total hit count is not affected.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Get the document types; empty means all.
    pub fn doc_types(&self) -> &[String] {
        &self.doc_types
    }

    /// Get the query.
    pub fn query(&self) -> &dyn Query {
        self.query.as_ref()
    }

    /// Get the post-filter.
    pub fn post_filter(&self) -> Option<&dyn Query> {
        self.post_filter.as_deref()
    }

    /// Get the hit offset.
    pub fn from(&self) -> usize {
        self.from
    }

    /// Get the page size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Check the request against the collection's mappings.
    ///
    /// Searching a type without a mapping, or a collection without any
    /// mapping, is a not-found error.
    pub fn validate(&self, mappings: &MappingSet) -> Result<()> {
        if mappings.is_empty() {
            return Err(KindredError::not_found("collection has no mappings"));
        }
        for doc_type in &self.doc_types {
            mappings.require(doc_type)?;
        }

        self.query.validate(mappings)?;
        if let Some(filter) = &self.post_filter {
            filter.validate(mappings)?;
        }
        Ok(())
    }

    /// Parse a JSON search body.
    ///
    /// ```json
    /// { "types": ["profile"], "query": {..}, "post_filter": {..}, "from": 0, "size": 10 }
    /// ```
    ///
    /// `type` may name a single type and `filter` may stand for
    /// `post_filter`. A missing query matches everything.
    pub fn from_json(value: &Value, parser: &QueryParser) -> Result<Self> {
        let body = value
            .as_object()
            .ok_or_else(|| KindredError::parse("search body must be a JSON object"))?;

        let query = match body.get("query") {
            Some(query) => parser.parse(query)?,
            None => Box::new(MatchAllQuery::new()),
        };
        let mut request = SearchRequest::new(query);

        if let Some(types) = body.get("types") {
            let types = types
                .as_array()
                .ok_or_else(|| KindredError::parse("types must be an array"))?
                .iter()
                .map(|t| {
                    t.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| KindredError::parse("types must be strings"))
                })
                .collect::<Result<Vec<_>>>()?;
            request = request.with_types(types);
        } else if let Some(doc_type) = body.get("type").and_then(Value::as_str) {
            request = request.with_type(doc_type);
        }

        if let Some(filter) = body.get("post_filter").or_else(|| body.get("filter")) {
            request = request.with_post_filter(parser.parse(filter)?);
        }
        if let Some(from) = body.get("from") {
            let from = from
                .as_u64()
                .ok_or_else(|| KindredError::parse("from must be a non-negative number"))?;
            request = request.with_from(from as usize);
        }
        if let Some(size) = body.get("size") {
            let size = size
                .as_u64()
                .ok_or_else(|| KindredError::parse("size must be a non-negative number"))?;
            request = request.with_size(size as usize);
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Mapping;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let request = SearchRequest::from_json(
            &json!({
                "type": "profile",
                "query": {"term": {"name": "frederic"}},
                "post_filter": {"has_child": {"type": "connection", "filter": {"match_all": {}}}},
                "from": 5,
                "size": 2
            }),
            &QueryParser::new(),
        )
        .unwrap();

        assert_eq!(request.doc_types(), ["profile".to_string()]);
        assert_eq!(request.query().description(), "name:frederic");
        assert!(request.post_filter().is_some());
        assert_eq!(request.from(), 5);
        assert_eq!(request.size(), 2);

        let all = SearchRequest::from_json(&json!({}), &QueryParser::new()).unwrap();
        assert_eq!(all.query().description(), "*:*");
        assert_eq!(all.size(), SearchRequest::DEFAULT_SIZE);
    }

    #[test]
    fn test_validate() {
        let mut mappings = MappingSet::new();
        assert!(SearchRequest::match_all().validate(&mappings).unwrap_err().is_not_found());

        mappings
            .declare(Mapping::builder("profile").text("name").build().unwrap())
            .unwrap();
        assert!(SearchRequest::match_all().validate(&mappings).is_ok());
        assert!(SearchRequest::match_all()
            .with_type("connection")
            .validate(&mappings)
            .unwrap_err()
            .is_not_found());
    }
}
