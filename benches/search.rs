//! Benchmarks for full-text and dense search over the embedded engine.

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::cast_precision_loss)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;

use chunkbase::models::VECTOR;
use chunkbase::{Chunk, ChunkStore, DistanceMetric, Record, SqliteEngine, StoreSettings};

const WORDS: [&str; 12] = [
    "bloom", "filter", "harmful", "chemical", "conference", "football", "probabilistic",
    "structure", "office", "element", "member", "efficient",
];

/// Creates an in-memory store with `count` chunks and the full-text index.
fn populated_store(count: usize) -> ChunkStore<SqliteEngine> {
    let store = ChunkStore::open(SqliteEngine::in_memory(), StoreSettings::default())
        .expect("Failed to open store");

    let chunks: Vec<Record> = (0..count)
        .map(|i| {
            let text = (0..8)
                .map(|j| WORDS[(i * 7 + j * 3) % WORDS.len()])
                .collect::<Vec<_>>()
                .join(" ");
            let x = i as f32;
            Chunk {
                chunk_text: text,
                file_uuid: format!("uuid-{}", i / 10),
                filename: format!("file{}.txt", i / 10),
                vector: vec![x.sin(), x.cos(), (x * 0.5).sin(), (x * 0.25).cos()],
            }
            .into()
        })
        .collect();

    store.insert(chunks).expect("Failed to insert chunks");
    store.ensure_index().expect("Failed to create index");
    store
}

fn bench_search_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_scaling");
    group.measurement_time(Duration::from_secs(10));

    for count in &[100, 1_000, 10_000] {
        let store = populated_store(*count);

        group.bench_with_input(BenchmarkId::new("text_search", count), count, |b, _| {
            b.iter(|| black_box(store.search_by_text("bloom filter", 10).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("vector_search", count), count, |b, _| {
            b.iter(|| {
                black_box(
                    store
                        .search_by_vector(VECTOR, vec![0.1, 0.9, 0.2, 0.8], DistanceMetric::L2, 3)
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_metrics(c: &mut Criterion) {
    let store = populated_store(1_000);
    let mut group = c.benchmark_group("vector_metrics");

    for metric in [DistanceMetric::L2, DistanceMetric::Cosine, DistanceMetric::Ip] {
        group.bench_function(metric.as_str(), |b| {
            b.iter(|| {
                black_box(
                    store
                        .search_by_vector(VECTOR, vec![0.1, 0.9, 0.2, 0.8], metric, 10)
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_search_scaling, bench_metrics);
criterion_main!(benches);
