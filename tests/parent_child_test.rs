//! Integration tests for parent/child joins

use kindred::document::Document;
use kindred::engine::{Engine, EngineConfig};
use kindred::error::Result;
use kindred::index::BulkRequest;
use kindred::query::{BooleanQuery, HasChildQuery, HasParentQuery, MatchAllQuery, TermQuery};
use kindred::schema::Mapping;
use kindred::search::{SearchRequest, SearchResponse};
use serde_json::json;

const COLLECTION: &str = "connections";

fn engine_with_mappings() -> Result<Engine> {
    let engine = Engine::new(EngineConfig::default())?;
    engine.declare_mapping(
        COLLECTION,
        Mapping::from_json(
            "profile",
            &json!({
                "properties": {
                    "name": { "type": "string", "index": "not_analyzed" }
                }
            }),
        )?,
    )?;
    engine.declare_mapping(
        COLLECTION,
        Mapping::from_json(
            "connection",
            &json!({
                "_parent": { "type": "profile" },
                "properties": {
                    "sender": { "type": "string", "index": "not_analyzed" }
                }
            }),
        )?,
    )?;
    Ok(engine)
}

fn index_profile(engine: &Engine, user_name: &str) -> Result<()> {
    let request = BulkRequest::new().index(
        "profile",
        user_name,
        Document::builder().add_text("name", user_name).build(),
    );
    let response = engine.bulk(COLLECTION, request)?;
    assert!(!response.has_failures(), "{}", response.failure_message());
    engine.commit(COLLECTION)?;
    Ok(())
}

fn add_connection(engine: &Engine, user_name: &str, connection: &str) -> Result<()> {
    let request = BulkRequest::new().index_child(
        "connection",
        None,
        user_name,
        Document::builder().add_text("sender", connection).build(),
    );
    let response = engine.bulk(COLLECTION, request)?;
    assert!(!response.has_failures(), "{}", response.failure_message());
    engine.commit(COLLECTION)?;
    Ok(())
}

fn search_connected(engine: &Engine, current_user: &str, name: &str) -> Result<SearchResponse> {
    let request = SearchRequest::new(Box::new(TermQuery::new("name", name)))
        .with_type("profile")
        .with_post_filter(Box::new(HasChildQuery::new(
            "connection",
            Box::new(BooleanQuery::any_of(vec![
                Box::new(TermQuery::new("sender", current_user)),
                Box::new(TermQuery::new("receiver", current_user)),
            ])),
        )));
    engine.search(COLLECTION, &request)
}

#[test]
fn test_profile_without_connections() -> Result<()> {
    let engine = engine_with_mappings()?;
    index_profile(&engine, "Frederic")?;

    assert_eq!(search_connected(&engine, "BCH", "Frederic")?.total_hits, 0);
    Ok(())
}

#[test]
fn test_profile_with_one_connection() -> Result<()> {
    let engine = engine_with_mappings()?;
    index_profile(&engine, "Frederic")?;
    add_connection(&engine, "Frederic", "BCH")?;

    assert_eq!(search_connected(&engine, "BCH", "Frederic")?.total_hits, 1);
    Ok(())
}

#[test]
fn test_profile_with_two_connections() -> Result<()> {
    let engine = engine_with_mappings()?;
    index_profile(&engine, "Frederic")?;
    add_connection(&engine, "Frederic", "BCH")?;
    add_connection(&engine, "Frederic", "TCL")?;

    let response = search_connected(&engine, "BCH", "Frederic")?;
    assert_eq!(response.total_hits, 1, "a parent is returned once");
    assert_eq!(response.ids(), vec!["Frederic"]);
    Ok(())
}

#[test]
fn test_disjoint_connection_graphs() -> Result<()> {
    let engine = engine_with_mappings()?;
    index_profile(&engine, "Frederic")?;
    add_connection(&engine, "Frederic", "BCH")?;
    add_connection(&engine, "Frederic", "PAR")?;
    index_profile(&engine, "Philippe")?;
    add_connection(&engine, "Philippe", "BCH")?;
    add_connection(&engine, "Philippe", "FDR")?;
    index_profile(&engine, "Thibault")?;
    add_connection(&engine, "Thibault", "PAR")?;

    assert_eq!(search_connected(&engine, "BCH", "Frederic")?.total_hits, 1);
    assert_eq!(search_connected(&engine, "BCH", "Philippe")?.total_hits, 1);
    assert_eq!(search_connected(&engine, "BCH", "Thibault")?.total_hits, 0);
    Ok(())
}

#[test]
fn test_keyword_names_are_case_sensitive() -> Result<()> {
    let engine = engine_with_mappings()?;
    index_profile(&engine, "Frederic")?;
    add_connection(&engine, "Frederic", "BCH")?;

    assert_eq!(search_connected(&engine, "BCH", "frederic")?.total_hits, 0);
    assert_eq!(search_connected(&engine, "bch", "Frederic")?.total_hits, 0);
    Ok(())
}

#[test]
fn test_orphans_and_missing_parents() -> Result<()> {
    let engine = engine_with_mappings()?;
    add_connection(&engine, "Ghost", "BCH")?;
    index_profile(&engine, "Frederic")?;

    let request = SearchRequest::new(Box::new(MatchAllQuery::new()))
        .with_type("profile")
        .with_post_filter(Box::new(HasChildQuery::new(
            "connection",
            Box::new(TermQuery::new("sender", "BCH")),
        )));
    assert_eq!(engine.search(COLLECTION, &request)?.total_hits, 0);

    // The parent arrives after its child.
    index_profile(&engine, "Ghost")?;
    let response = engine.search(COLLECTION, &request)?;
    assert_eq!(response.ids(), vec!["Ghost"]);
    Ok(())
}

#[test]
fn test_child_requires_parent_id() -> Result<()> {
    let engine = engine_with_mappings()?;

    let err = engine
        .index(COLLECTION, "connection", None, None, Document::new())
        .unwrap_err();
    assert!(err.is_validation());

    let err = engine
        .index(COLLECTION, "profile", Some("1"), Some("2"), Document::new())
        .unwrap_err();
    assert!(err.is_validation());
    Ok(())
}

#[test]
fn test_has_parent() -> Result<()> {
    let engine = engine_with_mappings()?;
    index_profile(&engine, "Frederic")?;
    index_profile(&engine, "Philippe")?;
    add_connection(&engine, "Frederic", "BCH")?;
    add_connection(&engine, "Philippe", "PAR")?;

    let request = SearchRequest::new(Box::new(HasParentQuery::new(
        "profile",
        Box::new(TermQuery::new("name", "Philippe")),
    )))
    .with_type("connection");
    let response = engine.search(COLLECTION, &request)?;
    assert_eq!(response.total_hits, 1);
    assert_eq!(response.hits[0].parent.as_deref(), Some("Philippe"));
    Ok(())
}

#[test]
fn test_store_cascade_delete() -> Result<()> {
    let engine = engine_with_mappings()?;
    let store = engine.parent_child_store(COLLECTION, "profile", "connection")?;

    store.index_parent("Frederic", Document::builder().add_text("name", "Frederic").build())?;
    store.index_child(Document::builder().add_text("sender", "BCH").build(), "Frederic")?;
    store.index_child(Document::builder().add_text("sender", "PAR").build(), "Frederic")?;
    store.commit()?;
    assert_eq!(store.children_of("Frederic").len(), 2);

    let response = store.query_by_has_child(
        Box::new(TermQuery::new("name", "Frederic")),
        Box::new(TermQuery::new("sender", "PAR")),
    )?;
    assert_eq!(response.total_hits, 1);

    assert_eq!(store.delete_parent("Frederic", true)?, 2);
    store.commit()?;
    assert!(store.children_of("Frederic").is_empty());
    assert_eq!(engine.doc_count(COLLECTION)?, 0);
    Ok(())
}

#[test]
fn test_request_from_json() -> Result<()> {
    let engine = engine_with_mappings()?;
    index_profile(&engine, "Frederic")?;
    add_connection(&engine, "Frederic", "BCH")?;
    index_profile(&engine, "Thibault")?;
    add_connection(&engine, "Thibault", "PAR")?;

    let body = json!({
        "type": "profile",
        "query": { "match_all": {} },
        "post_filter": {
            "has_child": {
                "type": "connection",
                "filter": {
                    "or": [
                        { "term": { "sender": "BCH" } },
                        { "term": { "receiver": "BCH" } }
                    ]
                }
            }
        }
    });
    let request = SearchRequest::from_json(&body, engine.query_parser())?;
    assert_eq!(engine.search(COLLECTION, &request)?.ids(), vec!["Frederic"]);
    Ok(())
}
