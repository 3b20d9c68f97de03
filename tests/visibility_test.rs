//! Integration tests for commit visibility

use std::sync::Arc;
use std::thread;

use kindred::document::Document;
use kindred::engine::{Engine, EngineConfig};
use kindred::error::Result;
use kindred::index::BulkRequest;
use kindred::query::{HasChildQuery, MatchAllQuery, TermQuery};
use kindred::schema::{Dynamic, Mapping};
use kindred::search::SearchRequest;

const COLLECTION: &str = "social";

fn engine() -> Result<Engine> {
    let engine = Engine::new(EngineConfig::default())?;
    engine.declare_mapping(COLLECTION, Mapping::builder("profile").keyword("name").build()?)?;
    engine.declare_mapping(
        COLLECTION,
        Mapping::builder("connection")
            .parent("profile")
            .keyword("sender")
            .build()?,
    )?;
    Ok(engine)
}

fn profile(name: &str) -> Document {
    Document::builder().add_text("name", name).build()
}

fn count_all(engine: &Engine) -> Result<u64> {
    let request = SearchRequest::new(Box::new(MatchAllQuery::new()));
    Ok(engine.search(COLLECTION, &request)?.total_hits)
}

#[test]
fn test_writes_are_invisible_until_commit() -> Result<()> {
    let engine = engine()?;
    engine.put(COLLECTION, "profile", "1", profile("Frederic"))?;
    engine.index(
        COLLECTION,
        "connection",
        Some("c1"),
        Some("1"),
        Document::builder().add_text("sender", "BCH").build(),
    )?;

    assert_eq!(count_all(&engine)?, 0);
    assert!(engine.get(COLLECTION, "profile", "1")?.is_none());

    let generation = engine.commit(COLLECTION)?;
    assert_eq!(count_all(&engine)?, 2);
    assert!(engine.get(COLLECTION, "profile", "1")?.is_some());

    // Nothing buffered: same generation, same hits.
    let joined = SearchRequest::new(Box::new(HasChildQuery::new(
        "connection",
        Box::new(TermQuery::new("sender", "BCH")),
    )));
    let before = (count_all(&engine)?, engine.search(COLLECTION, &joined)?.total_hits);
    assert_eq!(engine.commit(COLLECTION)?, generation);
    let after = (count_all(&engine)?, engine.search(COLLECTION, &joined)?.total_hits);
    assert_eq!(before, after);
    assert_eq!(after, (2, 1));
    Ok(())
}

#[test]
fn test_reindex_replaces_and_delete_removes() -> Result<()> {
    let engine = engine()?;
    engine.put(COLLECTION, "profile", "1", profile("Frederic"))?;
    engine.commit(COLLECTION)?;

    engine.put(COLLECTION, "profile", "1", profile("Philippe"))?;
    engine.commit(COLLECTION)?;
    let by_name = |name: &str| SearchRequest::new(Box::new(TermQuery::new("name", name)));
    assert_eq!(engine.search(COLLECTION, &by_name("Frederic"))?.total_hits, 0);
    assert_eq!(engine.search(COLLECTION, &by_name("Philippe"))?.total_hits, 1);

    engine.delete(COLLECTION, "profile", "1")?;
    assert_eq!(count_all(&engine)?, 1);
    engine.commit(COLLECTION)?;
    assert_eq!(count_all(&engine)?, 0);
    Ok(())
}

#[test]
fn test_bulk_is_visible_as_a_whole() -> Result<()> {
    let engine = engine()?;
    let request = BulkRequest::new()
        .index("profile", "1", profile("Frederic"))
        .index_child("connection", None, "1", Document::builder().add_text("sender", "BCH").build())
        .index_child("connection", None, "", Document::new())
        .index("unknown", "x", Document::new());

    let response = engine.bulk(COLLECTION, request)?;
    assert_eq!(response.items.len(), 4);
    assert_eq!(response.succeeded(), 3, "{}", response.failure_message());
    assert!(response.items[2].is_failed());
    assert_eq!(count_all(&engine)?, 0);

    engine.commit(COLLECTION)?;
    let request = SearchRequest::new(Box::new(TermQuery::new("name", "Frederic")))
        .with_post_filter(Box::new(HasChildQuery::new(
            "connection",
            Box::new(TermQuery::new("sender", "BCH")),
        )));
    assert_eq!(engine.search(COLLECTION, &request)?.total_hits, 1);

    // `unknown` was created on the fly by the dynamic default.
    assert!(engine.get(COLLECTION, "unknown", "x")?.is_some());
    Ok(())
}

#[test]
fn test_strict_collections_reject_unmapped_types() -> Result<()> {
    let config = EngineConfig::builder()
        .default_dynamic(Dynamic::Strict)
        .build()?;
    let engine = Engine::new(config)?;
    engine.declare_mapping(COLLECTION, Mapping::builder("profile").keyword("name").build()?)?;

    let err = engine
        .put(COLLECTION, "unknown", "1", Document::new())
        .unwrap_err();
    assert!(err.is_not_found());

    let request = SearchRequest::new(Box::new(MatchAllQuery::new())).with_type("unknown");
    assert!(engine.search(COLLECTION, &request).unwrap_err().is_not_found());
    Ok(())
}

#[test]
fn test_concurrent_writers_and_readers() -> Result<()> {
    let engine = Arc::new(engine()?);

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || -> Result<()> {
                for i in 0..50 {
                    let id = format!("{t}-{i}");
                    engine.put(COLLECTION, "profile", &id, profile(&id))?;
                    if i % 10 == 9 {
                        engine.commit(COLLECTION)?;
                    }
                }
                Ok(())
            })
        })
        .collect();

    let reader = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || -> Result<()> {
            let mut last = 0;
            for _ in 0..100 {
                let seen = count_all(&engine)?;
                assert!(seen >= last, "committed documents never disappear");
                last = seen;
            }
            Ok(())
        })
    };

    for writer in writers {
        writer.join().expect("writer panicked")?;
    }
    reader.join().expect("reader panicked")?;

    engine.commit(COLLECTION)?;
    assert_eq!(count_all(&engine)?, 200);
    Ok(())
}
