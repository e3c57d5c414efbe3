//! Register lookup and prediction benchmarks
//!
//! - Register lookups by id and by pickletype
//! - Index rebuild cost on load
//! - Single-document prediction through the full pipeline

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;
use tempfile::TempDir;
use text_pipeliner::{
    EntryPayload, ModelMap, PickleRegister, PredictionService, Predictor, RegistryIndex,
    TextPipeline,
};

fn payload(name: &str) -> EntryPayload {
    serde_json::from_value(json!({
        "name": name,
        "answer_key": {"0": "ham", "1": "spam"},
        "description": "benchmark entry"
    }))
    .unwrap()
}

/// Pipeline over a vocabulary of `size` synthetic terms
fn pipeline(size: usize) -> TextPipeline {
    let vocabulary: serde_json::Map<String, serde_json::Value> =
        (0..size).map(|i| (format!("term{}", i), json!(i))).collect();
    let coef: Vec<f64> = (0..size)
        .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
        .collect();

    TextPipeline::from_json(
        &json!({
            "steps": [
                {"name": "vect", "stage": {"kind": "count_vectorizer", "vocabulary": vocabulary}},
                {"name": "tfidf", "stage": {"kind": "tfidf_transformer", "idf": vec![1.0; size]}},
                {"name": "clf", "stage": {
                    "kind": "linear_classifier",
                    "coef": [coef],
                    "intercept": [0.0],
                    "classes": [0, 1]
                }}
            ]
        })
        .to_string(),
    )
    .unwrap()
}

/// Register with `count` entries spread over four pickletypes
fn populated_register(dir: &TempDir, count: usize) -> PickleRegister {
    let mut register =
        PickleRegister::load(dir.path().join("register.json"), dir.path(), true).unwrap();
    for i in 0..count {
        register
            .new_entry_from_value(payload(&format!("pickle{:04}", i)), &format!("type{}", i % 4), None)
            .unwrap();
    }
    register
}

/// Benchmark lookups by id and by pickletype
fn bench_register_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("register_lookup");

    for count in [10, 100, 1000] {
        let dir = TempDir::new().unwrap();
        let register = populated_register(&dir, count);

        group.bench_with_input(BenchmarkId::new("get", count), &register, |b, register| {
            b.iter(|| register.get(black_box("pickle0000")));
        });
        group.bench_with_input(
            BenchmarkId::new("ids_by_type", count),
            &register,
            |b, register| {
                b.iter(|| register.ids_by_type(black_box("type1")).map(|ids| ids.len()));
            },
        );
    }
    group.finish();
}

/// Benchmark index rebuild as done on every load
fn bench_index_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_rebuild");

    for count in [100, 1000] {
        let dir = TempDir::new().unwrap();
        let register = populated_register(&dir, count);

        group.bench_with_input(
            BenchmarkId::new("entries", count),
            register.document(),
            |b, document| {
                b.iter(|| RegistryIndex::rebuild(document.register.values()));
            },
        );
    }
    group.finish();
}

/// Benchmark a prediction through the service
fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict");
    let text = (0..200)
        .map(|i| format!("term{}", i * 7))
        .collect::<Vec<_>>()
        .join(" ");

    for size in [1_000, 50_000] {
        let dir = TempDir::new().unwrap();
        let register = populated_register(&dir, 1);
        let mut models = ModelMap::new();
        let model: Arc<dyn Predictor> = Arc::new(pipeline(size));
        models.insert("pickle0000".to_string(), model);
        let service = PredictionService::new(register, models);

        group.bench_with_input(BenchmarkId::new("vocabulary", size), &service, |b, service| {
            b.iter(|| service.predict(black_box("pickle0000"), black_box(&text)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_register_lookup,
    bench_index_rebuild,
    bench_predict
);
criterion_main!(benches);
