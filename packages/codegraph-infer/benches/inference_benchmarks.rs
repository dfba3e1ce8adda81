//! Performance benchmarks for GraphInference
//!
//! Covers the hot paths of training and prediction:
//! - Index rebuild from a populated weight store
//! - MAP inference per preset (local search) and with loopy BP
//! - One SSVM step on a mid-sized graph

use codegraph_infer::config::{InferenceConfig, Preset, SolverKind};
use codegraph_infer::{FeatureKey, GraphInference, PairwiseFeature, Query, QueryBuilder};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const UNKNOWN: u32 = 0;
const LABELS: u32 = 64;

// ============================================================================
// Fixtures
// ============================================================================

/// Deterministic pseudo-random weights over `LABELS x LABELS x 4` arc types
fn populated_engine(config: InferenceConfig) -> GraphInference {
    let mut engine = GraphInference::new(config).unwrap();
    engine.set_unknown_label(UNKNOWN);

    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    for a in 1..=LABELS {
        for b in 1..=LABELS {
            for kind in 0..4 {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let w = ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5;
                engine
                    .weights()
                    .set(&FeatureKey::Pairwise(PairwiseFeature::new(a, b, kind)), w);
            }
        }
    }
    engine.prepare_for_inference();
    engine
}

/// Grid-like graph: a chain with a skip arc every third node
fn grid_query(n: usize) -> Query {
    let mut builder = QueryBuilder::new(UNKNOWN);
    for _ in 0..n {
        builder.add_node(0, 1..=LABELS);
    }
    for i in 1..n {
        builder.add_arc(i - 1, i, (i % 4) as u32).unwrap();
        if i >= 3 && i % 3 == 0 {
            builder.add_arc(i - 3, i, 3).unwrap();
        }
    }
    builder.build()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_index_rebuild(c: &mut Criterion) {
    let mut engine = populated_engine(InferenceConfig::default());
    let mut group = c.benchmark_group("index_rebuild");
    group.throughput(Throughput::Elements(engine.weights().len() as u64));

    group.bench_function("pairwise_16k", |b| {
        b.iter(|| {
            engine.prepare_for_inference();
            black_box(engine.index().indexed_features())
        });
    });

    group.finish();
}

fn bench_map_inference(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_inference");

    for preset in [Preset::Fast, Preset::Balanced] {
        let engine = populated_engine(InferenceConfig::preset(preset));
        for n in [16usize, 128] {
            let query = grid_query(n);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", preset), n),
                &query,
                |b, query| {
                    b.iter(|| {
                        let mut assignment = engine.create_assignment(query);
                        let stats = engine.map_inference(&mut assignment);
                        black_box((stats, assignment.score()))
                    });
                },
            );
        }
    }

    let engine = populated_engine(
        InferenceConfig::preset(Preset::Fast)
            .solver(SolverKind::LoopyBp)
            .belief_propagation(|c| c.max_domain_size(8)),
    );
    let query = grid_query(32);
    group.bench_function("LoopyBp/32", |b| {
        b.iter(|| {
            let mut assignment = engine.create_assignment(&query);
            black_box(engine.map_inference(&mut assignment))
        });
    });

    group.finish();
}

fn bench_ssvm_step(c: &mut Criterion) {
    let engine = populated_engine(InferenceConfig::preset(Preset::Fast));
    let query = grid_query(64);
    let mut gold = engine.create_assignment(&query);
    let moves: Vec<_> = (0..query.num_nodes())
        .map(|n| (n, 1 + (n as u32 * 7) % LABELS))
        .collect();
    gold.apply_moves(&moves, engine.weights());

    c.bench_function("ssvm_step_64", |b| {
        b.iter(|| black_box(engine.ssvm_learn(&gold, 1e-6)));
    });
}

criterion_group!(
    benches,
    bench_index_rebuild,
    bench_map_inference,
    bench_ssvm_step
);
criterion_main!(benches);
