//! JSON query DSL.
//!
//! Queries and filters share one JSON form, one query per object:
//!
//! | Form | Query |
//! |---|---|
//! | `{"match_all": {}}` | [`MatchAllQuery`] |
//! | `{"term": {"field": "value"}}` | [`TermQuery`] |
//! | `{"fuzzy": {"field": {"value": "v", "fuzziness": "AUTO"}}}` | [`FuzzyQuery`] |
//! | `{"bool": {"must": [..], "should": [..], "must_not": [..]}}` | [`BooleanQuery`] |
//! | `{"or": [..]}`, `{"and": [..]}`, `{"not": {..}}` | [`BooleanQuery`] |
//! | `{"nested": {"path": "p", "filter": {..}}}` | [`NestedQuery`] |
//! | `{"has_child": {"type": "t", "filter": {..}}}` | [`HasChildQuery`] |
//! | `{"has_parent": {"parent_type": "t", "filter": {..}}}` | [`HasParentQuery`] |
//!
//! `query` and `filter` are interchangeable wherever an inner query is
//! expected.

use serde_json::{Map, Value};

use crate::error::{KindredError, Result};
use crate::query::boolean::{BooleanQuery, Occur};
use crate::query::fuzzy::{Fuzziness, FuzzyQuery};
use crate::query::has_child::HasChildQuery;
use crate::query::has_parent::HasParentQuery;
use crate::query::match_all::MatchAllQuery;
use crate::query::nested::NestedQuery;
use crate::query::query::Query;
use crate::query::term::TermQuery;

/// A parser for the JSON query DSL.
#[derive(Debug, Clone, Default)]
pub struct QueryParser {
    /// Fuzziness of fuzzy queries that do not set one.
    default_fuzziness: Fuzziness,
}

impl QueryParser {
    /// Create a new query parser.
    pub fn new() -> Self {
        QueryParser::default()
    }

    /// Set the fuzziness used when a fuzzy query does not specify one.
    pub fn with_default_fuzziness(mut self, fuzziness: Fuzziness) -> Self {
        self.default_fuzziness = fuzziness;
        self
    }

    /// Parse a query from a JSON string.
    pub fn parse_str(&self, source: &str) -> Result<Box<dyn Query>> {
        let value: Value = serde_json::from_str(source)
            .map_err(|e| KindredError::parse(format!("invalid query JSON: {e}")))?;
        self.parse(&value)
    }

    /// Parse a query from a JSON value.
    pub fn parse(&self, value: &Value) -> Result<Box<dyn Query>> {
        let object = value
            .as_object()
            .ok_or_else(|| KindredError::parse(format!("query must be an object, got {value}")))?;

        let mut entries = object.iter();
        let (kind, body) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            (None, _) => return Err(KindredError::parse("query object is empty")),
            (Some(_), Some(_)) => {
                return Err(KindredError::parse(format!(
                    "query object must have exactly one key, got {}",
                    object.keys().cloned().collect::<Vec<_>>().join(", ")
                )));
            }
        };

        match kind.as_str() {
            "match_all" => Ok(Box::new(MatchAllQuery::new())),
            "term" => self.parse_term(body),
            "fuzzy" => self.parse_fuzzy(body),
            "bool" => self.parse_bool(body),
            "or" => self.parse_junction(body, Occur::Should),
            "and" => self.parse_junction(body, Occur::Must),
            "not" => {
                let mut query = BooleanQuery::new();
                query.add_must_not(self.parse_inner(body, "not")?);
                Ok(Box::new(query))
            }
            "nested" => self.parse_nested(body),
            "has_child" => self.parse_has_child(body),
            "has_parent" => self.parse_has_parent(body),
            other => Err(KindredError::parse(format!("unknown query type [{other}]"))),
        }
    }

    fn parse_term(&self, body: &Value) -> Result<Box<dyn Query>> {
        let (field, value) = single_field(body, "term")?;
        let value = match value {
            Value::Object(options) => options
                .get("value")
                .ok_or_else(|| KindredError::parse(format!("[term] missing value for [{field}]")))?,
            value => value,
        };
        Ok(Box::new(TermQuery::new(field, scalar_term(value, "term")?)))
    }

    fn parse_fuzzy(&self, body: &Value) -> Result<Box<dyn Query>> {
        let (field, value) = single_field(body, "fuzzy")?;

        let query = match value {
            Value::Object(options) => {
                let term = options.get("value").ok_or_else(|| {
                    KindredError::parse(format!("[fuzzy] missing value for [{field}]"))
                })?;
                let mut query = FuzzyQuery::new(field, scalar_term(term, "fuzzy")?)
                    .fuzziness(self.default_fuzziness);
                if let Some(fuzziness) = options.get("fuzziness") {
                    query = query.fuzziness(Fuzziness::from_json(fuzziness)?);
                }
                if let Some(prefix) = options.get("prefix_length") {
                    let prefix = prefix.as_u64().ok_or_else(|| {
                        KindredError::parse("[fuzzy] prefix_length must be a number")
                    })?;
                    query = query.prefix_length(prefix as usize);
                }
                if let Some(transpositions) = options.get("transpositions") {
                    let transpositions = transpositions.as_bool().ok_or_else(|| {
                        KindredError::parse("[fuzzy] transpositions must be a boolean")
                    })?;
                    query = query.transpositions(transpositions);
                }
                query
            }
            term => FuzzyQuery::new(field, scalar_term(term, "fuzzy")?)
                .fuzziness(self.default_fuzziness),
        };

        Ok(Box::new(query))
    }

    fn parse_bool(&self, body: &Value) -> Result<Box<dyn Query>> {
        let options = body
            .as_object()
            .ok_or_else(|| KindredError::parse("[bool] must be an object"))?;

        let mut query = BooleanQuery::new();
        for (key, value) in options {
            let occur = match key.as_str() {
                "must" | "filter" => Occur::Must,
                "should" => Occur::Should,
                "must_not" => Occur::MustNot,
                "minimum_should_match" => {
                    let minimum = value.as_u64().ok_or_else(|| {
                        KindredError::parse("[bool] minimum_should_match must be a number")
                    })?;
                    query = query.with_minimum_should_match(minimum as usize);
                    continue;
                }
                other => {
                    return Err(KindredError::parse(format!(
                        "[bool] unknown clause [{other}]"
                    )));
                }
            };

            for clause in self.parse_list(value)? {
                match occur {
                    Occur::Must => query.add_must(clause),
                    Occur::Should => query.add_should(clause),
                    Occur::MustNot => query.add_must_not(clause),
                }
            }
        }

        Ok(Box::new(query))
    }

    fn parse_junction(&self, body: &Value, occur: Occur) -> Result<Box<dyn Query>> {
        // Both `[..]` and `{"filters": [..]}` are accepted.
        let list = match body.get("filters") {
            Some(filters) => filters,
            None => body,
        };

        let clauses = self.parse_list(list)?;
        if clauses.is_empty() {
            return Err(KindredError::parse("[or]/[and] need at least one filter"));
        }

        let query = match occur {
            Occur::Should => BooleanQuery::any_of(clauses),
            _ => BooleanQuery::all_of(clauses),
        };
        Ok(Box::new(query))
    }

    fn parse_nested(&self, body: &Value) -> Result<Box<dyn Query>> {
        let path = required_str(body, &["path"], "nested")?;
        let inner = self.parse_inner(body, "nested")?;
        Ok(Box::new(NestedQuery::new(path, inner)))
    }

    fn parse_has_child(&self, body: &Value) -> Result<Box<dyn Query>> {
        let child_type = required_str(body, &["type", "child_type"], "has_child")?;
        let inner = self.parse_inner(body, "has_child")?;
        Ok(Box::new(HasChildQuery::new(child_type, inner)))
    }

    fn parse_has_parent(&self, body: &Value) -> Result<Box<dyn Query>> {
        let parent_type = required_str(body, &["parent_type", "type"], "has_parent")?;
        let inner = self.parse_inner(body, "has_parent")?;
        Ok(Box::new(HasParentQuery::new(parent_type, inner)))
    }

    /// Parse the `query`/`filter` member of a compound query, or the body
    /// itself for `not`.
    fn parse_inner(&self, body: &Value, kind: &str) -> Result<Box<dyn Query>> {
        match body.get("query").or_else(|| body.get("filter")) {
            Some(inner) => self.parse(inner),
            None if kind == "not" => self.parse(body),
            None => Err(KindredError::parse(format!(
                "[{kind}] requires a query or filter"
            ))),
        }
    }

    fn parse_list(&self, value: &Value) -> Result<Vec<Box<dyn Query>>> {
        match value {
            Value::Array(items) => items.iter().map(|item| self.parse(item)).collect(),
            single => Ok(vec![self.parse(single)?]),
        }
    }
}

fn single_field<'a>(body: &'a Value, kind: &str) -> Result<(&'a String, &'a Value)> {
    let object: &Map<String, Value> = body
        .as_object()
        .ok_or_else(|| KindredError::parse(format!("[{kind}] must be an object")))?;
    let mut entries = object.iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Ok(entry),
        _ => Err(KindredError::parse(format!(
            "[{kind}] must name exactly one field"
        ))),
    }
}

fn scalar_term(value: &Value, kind: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string()),
        }),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(KindredError::parse(format!(
            "[{kind}] value must be a string, number or boolean, got {other}"
        ))),
    }
}

fn required_str<'a>(body: &'a Value, keys: &[&str], kind: &str) -> Result<&'a str> {
    keys.iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .ok_or_else(|| KindredError::parse(format!("[{kind}] requires [{}]", keys[0])))
}
