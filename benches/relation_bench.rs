//! Criterion benchmarks for relationship queries.
//!
//! Covers nested matching over a parent with many objects, has_child joins
//! over many parents, and commit throughput of bulk writes.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use kindred::document::Document;
use kindred::engine::{Engine, EngineConfig};
use kindred::index::BulkRequest;
use kindred::query::{BooleanQuery, FuzzyQuery, HasChildQuery, NestedQuery, Query, TermQuery};
use kindred::schema::{Mapping, ObjectMapping};
use kindred::search::SearchRequest;

const COLLECTION: &str = "bench";

fn engine() -> Engine {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    engine
        .declare_mapping(
            COLLECTION,
            Mapping::builder("profile")
                .text("name")
                .nested("connections", ObjectMapping::new().keyword("userId").text("type"))
                .build()
                .unwrap(),
        )
        .unwrap();
    engine
        .declare_mapping(
            COLLECTION,
            Mapping::builder("connection")
                .parent("profile")
                .keyword("sender")
                .build()
                .unwrap(),
        )
        .unwrap();
    engine
}

fn connection(user_id: String) -> Document {
    Document::builder()
        .add_text("userId", user_id)
        .add_text("type", "validated")
        .build()
}

fn validated(user_id: &str) -> Box<dyn Query> {
    Box::new(BooleanQuery::all_of(vec![
        Box::new(TermQuery::new("connections.userId", user_id)),
        Box::new(TermQuery::new("connections.type", "validated")),
    ]))
}

/// Benchmark a nested match against one parent with many objects.
fn bench_nested_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_match");
    group.sample_size(20);

    for count in [1_000usize, 10_000, 50_000] {
        let engine = engine();
        let mut objects: Vec<Document> = (0..count - 1).map(|i| connection(format!("conn{i}"))).collect();
        objects.push(connection("BCH".to_string()));

        let store = engine.nested_store(COLLECTION, "profile").unwrap();
        store
            .index_with_nested(
                "Frederic",
                Document::builder().add_text("name", "Frederic").build(),
                "connections",
                objects,
            )
            .unwrap();
        store.commit().unwrap();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let request = SearchRequest::new(Box::new(FuzzyQuery::new("name", "Frederic")))
                    .with_post_filter(Box::new(NestedQuery::new("connections", validated("BCH"))));
                let response = engine.search(COLLECTION, black_box(&request)).unwrap();
                assert_eq!(response.total_hits, 1);
            })
        });
    }

    group.finish();
}

/// Benchmark has_child over many parents with a few children each.
fn bench_has_child(c: &mut Criterion) {
    let mut group = c.benchmark_group("has_child");

    for parents in [100usize, 1_000, 10_000] {
        let engine = engine();
        let mut request = BulkRequest::new();
        for p in 0..parents {
            let id = format!("p{p}");
            request = request.index("profile", id.as_str(), Document::builder().add_text("name", id.as_str()).build());
            // Every other parent is connected to BCH.
            let senders: &[&str] = if p % 2 == 0 { &["BCH", "PAR"] } else { &["PAR", "FDR"] };
            for sender in senders {
                request = request.index_child(
                    "connection",
                    None,
                    id.as_str(),
                    Document::builder().add_text("sender", *sender).build(),
                );
            }
        }
        engine.bulk(COLLECTION, request).unwrap();
        engine.commit(COLLECTION).unwrap();

        group.throughput(Throughput::Elements(parents as u64));
        group.bench_with_input(BenchmarkId::from_parameter(parents), &parents, |b, _| {
            b.iter(|| {
                let request = SearchRequest::new(Box::new(HasChildQuery::new(
                    "connection",
                    Box::new(BooleanQuery::any_of(vec![
                        Box::new(TermQuery::new("sender", "BCH")),
                        Box::new(TermQuery::new("receiver", "BCH")),
                    ])),
                )))
                .with_type("profile");
                black_box(engine.search(COLLECTION, &request).unwrap())
            })
        });
    }

    group.finish();
}

/// Benchmark buffering and committing bulk writes.
fn bench_bulk_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_commit");
    group.sample_size(20);

    for size in [100usize, 1_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let engine = engine();
                let mut request = BulkRequest::new();
                for i in 0..size {
                    request = request.index(
                        "profile",
                        format!("{i}"),
                        Document::builder().add_text("name", format!("user {i}")).build(),
                    );
                }
                engine.bulk(COLLECTION, request).unwrap();
                black_box(engine.commit(COLLECTION).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_nested_match, bench_has_child, bench_bulk_commit);
criterion_main!(benches);
