//! RegretGraph Benchmark Suite
//!
//! Targets at the expected scale (hundreds to low thousands of nodes):
//!   node_add_single .................. < 5μs
//!   betweenness_500 .................. < 50ms
//!   causal_forgetting_500 ............ < 60ms
//!   analyze_clusters_500 ............. < 50ms
//!   snapshot_encode_decode_500 ....... < 5ms

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use chrono::{Duration, Utc};
use regret_core::centrality::betweenness;
use regret_core::community::analyze_clusters;
use regret_core::forgetting::{ForgettingPolicy, causal_forgetting};
use regret_core::snapshot;
use regret_core::{Emotion, Judgment, MemoryGraph, NodeId, RegretScores};

fn scores(i: u64) -> RegretScores {
    #[allow(clippy::cast_precision_loss)]
    let v = (i % 10 + 1) as f64;
    RegretScores::clamped(v, 11.0 - v, ((i * 7) % 10 + 1) as f64)
}

/// A chain of `n` nodes spread over 20 days, with a back-link every
/// seventh node so the graph is not a bare path.
fn make_graph(n: u64) -> MemoryGraph {
    let now = Utc::now();
    let mut graph = MemoryGraph::new();
    for i in 0..n {
        let judgment = if i % 3 == 0 { Judgment::Bad } else { Judgment::Good };
        graph.add(
            format!("Prompt number {i} about topic {}", i % 13),
            "response",
            judgment,
            scores(i),
            Emotion::Neutral,
            Some(now - Duration::days((i % 20) as i64)),
        );
    }
    for i in (8..=n).step_by(7) {
        let _ = graph.link(NodeId(i), NodeId(i - 7));
    }
    graph
}

fn bench_node_add(c: &mut Criterion) {
    let mut graph = make_graph(200);
    c.bench_function("node_add_single", |b| {
        b.iter(|| {
            graph.add(
                black_box("Tell me a joke"),
                "Why did the chicken cross the road?",
                Judgment::Good,
                RegretScores::fallback(),
                Emotion::Happy,
                None,
            )
        });
    });
}

fn bench_betweenness(c: &mut Criterion) {
    let mut group = c.benchmark_group("betweenness");
    for n in [100u64, 500, 1000] {
        let graph = make_graph(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &graph, |b, graph| {
            b.iter(|| black_box(betweenness(graph)));
        });
    }
    group.finish();
}

fn bench_forgetting(c: &mut Criterion) {
    let graph = make_graph(500);
    let policy = ForgettingPolicy {
        regret_threshold: 5.0,
        age_days_threshold: 7,
    };
    let now = Utc::now();
    c.bench_function("causal_forgetting_500", |b| {
        b.iter_batched(
            || graph.clone(),
            |mut g| black_box(causal_forgetting(&mut g, &policy, now)),
            BatchSize::LargeInput,
        );
    });
}

fn bench_clusters(c: &mut Criterion) {
    let graph = make_graph(500);
    c.bench_function("analyze_clusters_500", |b| {
        b.iter(|| black_box(analyze_clusters(&graph)));
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let graph = make_graph(500);
    c.bench_function("snapshot_encode_decode_500", |b| {
        b.iter(|| {
            let blob = snapshot::encode(black_box(&graph), true).expect("encode");
            black_box(snapshot::decode(&blob).expect("decode"))
        });
    });
}

criterion_group!(
    benches,
    bench_node_add,
    bench_betweenness,
    bench_forgetting,
    bench_clusters,
    bench_snapshot,
);
criterion_main!(benches);
