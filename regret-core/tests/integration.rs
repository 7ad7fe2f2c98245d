//! Integration Tests — End-to-End Memory Graph Flows
//!
//! Complete lifecycle scenarios through the public engine API:
//! record → forget → cluster → feedback → persist → restore.

use chrono::{Duration, Utc};

use regret_core::engine::MemoryEngine;
use regret_core::forgetting::ForgettingPolicy;
use regret_core::snapshot::SnapshotStore;
use regret_core::{ClusterReport, Emotion, Judgment, MemoryConfig, NodeId, RegretConfig, RegretScores};

fn scores(e: f64, f: f64, x: f64) -> RegretScores {
    RegretScores::new(e, f, x).expect("valid scores")
}

/// Regrets exactly {3, 2, 9}, judgments {good, good, bad}, ages {0, 2, 10} days.
fn scenario_engine() -> MemoryEngine {
    let now = Utc::now();
    let engine = MemoryEngine::default();
    engine.add("Hello world", "Hi there", Judgment::Good, scores(3.0, 7.0, 7.0), Emotion::Neutral, Some(now));
    engine.add(
        "Tell me a joke",
        "Why did the chicken cross the road?",
        Judgment::Good,
        scores(2.0, 8.0, 8.0),
        Emotion::Happy,
        Some(now - Duration::days(2)),
    );
    engine.add(
        "Insult me",
        "You're stupid",
        Judgment::Bad,
        scores(9.0, 1.0, 1.0),
        Emotion::Angry,
        Some(now - Duration::days(10)),
    );
    engine
}

// ---------------------------------------------------------------------------
// Causal forgetting
// ---------------------------------------------------------------------------

#[test]
fn forgetting_scenario_retains_high_regret_and_bridge() {
    let engine = scenario_engine();
    let removed = engine.causal_forgetting(5.0, 7);

    assert_eq!(removed, 1);
    assert!(engine.node(NodeId(1)).is_err(), "low-regret chain endpoint is peripheral");
    assert!(engine.node(NodeId(2)).is_ok(), "recent bridge survives");
    assert!(engine.node(NodeId(3)).is_ok(), "regret 9 ≥ 5 is always kept");

    let counters = engine.counters();
    assert_eq!(counters.nodes_added, 3);
    assert_eq!(counters.nodes_forgotten, 1);
    assert_eq!(counters.forgetting_passes, 1);
}

#[test]
fn regret_exactly_at_forgetting_threshold_is_kept() {
    let engine = scenario_engine();
    assert_eq!(engine.node(NodeId(1)).expect("node").overall_regret(), 3.0);

    assert_eq!(engine.causal_forgetting(3.0, 7), 0, "3.0 is not below 3.0");
    assert!(engine.node(NodeId(1)).is_ok());

    assert_eq!(engine.causal_forgetting(3.001, 7), 1);
    assert!(engine.node(NodeId(1)).is_err());
}

#[test]
fn repeated_forgetting_eventually_stabilises() {
    let engine = scenario_engine();
    engine.causal_forgetting(5.0, 7);
    // Two nodes left: 2 → 3. Node 2 is now an endpoint (centrality 0).
    assert_eq!(engine.causal_forgetting(5.0, 7), 1);
    // One node left: no-op.
    assert_eq!(engine.causal_forgetting(5.0, 7), 0);
    assert_eq!(engine.len(), 1);
}

#[test]
fn new_nodes_chain_after_survivors() {
    let engine = scenario_engine();
    engine.causal_forgetting(5.0, 7);
    let id = engine.add("again", "r", Judgment::Neutral, RegretScores::fallback(), Emotion::Neutral, None);
    assert_eq!(id, NodeId(4));
    let edges = engine.export().edges;
    assert_eq!(edges, vec![(NodeId(2), NodeId(3)), (NodeId(3), NodeId(4))]);
}

#[test]
fn forgetting_against_a_future_clock_marks_everything_stale() {
    let engine = scenario_engine();
    let policy = ForgettingPolicy {
        regret_threshold: 5.0,
        age_days_threshold: 7,
    };
    let removed = engine.causal_forgetting_at(&policy, Utc::now() + Duration::days(30));
    assert_eq!(removed, 2);
    assert_eq!(engine.len(), 1);
    assert!(engine.node(NodeId(3)).is_ok());
}

// ---------------------------------------------------------------------------
// Clusters, recall, feedback
// ---------------------------------------------------------------------------

#[test]
fn clusters_cover_every_node() {
    let engine = MemoryEngine::default();
    for i in 0..12 {
        engine.add(format!("prompt {i}"), "r", Judgment::Good, scores(2.0, 8.0, 8.0), Emotion::Happy, None);
    }
    let report = engine.analyze_clusters();
    assert!(report.count() >= 1);
    assert_eq!(report.sizes().iter().sum::<usize>(), 12);

    let ClusterReport::Clusters { clusters } = report else {
        panic!("expected clusters");
    };
    for cluster in clusters {
        assert!((cluster.mean_overall_regret - 2.0).abs() < 1e-9);
    }
}

#[test]
fn past_regret_recall_only_sees_high_regret_prompts() {
    let engine = scenario_engine();
    let threshold = MemoryConfig::default().regret_threshold;
    assert!(engine.check_past_regrets("please insult everyone", threshold));
    assert!(!engine.check_past_regrets("tell me a joke please", threshold));
    assert!(!engine.check_past_regrets("completely unrelated words", threshold));
}

#[test]
fn past_regret_recall_skips_regret_exactly_at_threshold() {
    let engine = scenario_engine();
    // "Hello world" sits at exactly 3.0.
    assert!(!engine.check_past_regrets("hello again", 3.0));
    assert!(engine.check_past_regrets("hello again", 2.999));
}

#[test]
fn feedback_moves_node_across_forgetting_threshold() {
    let engine = scenario_engine();
    // Node 3 starts at regret 9. Three strongly positive ratings bring it down.
    for _ in 0..3 {
        engine.feedback_adjust(NodeId(3), 10).expect("feedback");
    }
    let node = engine.node(NodeId(3)).expect("node");
    assert!(node.overall_regret() < 5.0);
    assert!((node.residual_regret - node.overall_regret()).abs() < 1e-9);

    // Now stale, low-regret, and an endpoint.
    assert_eq!(engine.causal_forgetting(5.0, 7), 2);
    assert_eq!(engine.len(), 1);
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

#[test]
fn out_of_range_scores_never_reach_the_graph() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::new(dir.path().join("graph.bin"), true);
    let engine = MemoryEngine::default();

    assert!(RegretScores::new(0.0, 12.0, 5.0).is_err());
    let scores = RegretScores::clamped(0.0, 12.0, 5.0);
    assert_eq!(scores, RegretScores::new(1.0, 10.0, 5.0).expect("valid"));
    engine.add("edge case", "r", Judgment::Neutral, scores, Emotion::Neutral, None);

    engine.save(&store).expect("save");
    let restored = MemoryEngine::default();
    assert!(restored.load(&store), "every stored score must load back");
    assert_eq!(restored.node(NodeId(1)).expect("node").regret_scores, scores);
}

#[test]
fn snapshot_round_trip_preserves_everything() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::new(dir.path().join("nested").join("graph.bin"), true);

    let engine = scenario_engine();
    engine.link(NodeId(1), NodeId(3)).expect("link");
    engine.feedback_adjust(NodeId(2), 3).expect("feedback");
    engine.decay_residual_regret(Utc::now());
    engine.save(&store).expect("save");

    let restored = MemoryEngine::default();
    assert!(restored.load(&store));
    assert_eq!(restored.export(), engine.export());
    for id in 1..=3 {
        assert_eq!(
            restored.node(NodeId(id)).expect("node"),
            engine.node(NodeId(id)).expect("node")
        );
    }
    assert_eq!(restored.mood(), engine.mood());
}

#[test]
fn corrupt_snapshot_leaves_graph_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("graph.bin");
    let store = SnapshotStore::new(&path, true);
    scenario_engine().save(&store).expect("save");

    let mut bytes = std::fs::read(&path).expect("read");
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x5A;
    std::fs::write(&path, bytes).expect("write");

    let engine = MemoryEngine::default();
    engine.add("live", "state", Judgment::Good, scores(1.0, 10.0, 10.0), Emotion::Confident, None);
    let before = engine.export();

    assert!(!engine.load(&store));
    assert!(engine.try_load(&store).is_err());
    assert_eq!(engine.export(), before);
    assert_eq!(engine.counters().snapshots_rejected, 2);
}

#[test]
fn snapshot_without_checksum_still_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::new(dir.path().join("graph.bin"), false);
    let engine = scenario_engine();
    engine.save(&store).expect("save");

    let restored = MemoryEngine::default();
    assert_eq!(restored.try_load(&store).expect("load"), 3);
    assert_eq!(restored.export(), engine.export());
}

#[test]
fn store_from_config_uses_persistence_section() {
    let dir = tempfile::tempdir().expect("tempdir");
    let snapshot = dir.path().join("from_config.bin");
    let config = RegretConfig::from_toml(&format!(
        "[persistence]\nsnapshot_path = {:?}\nchecksum_enabled = false\n",
        snapshot.display().to_string()
    ))
    .expect("config");

    let store = SnapshotStore::from_config(&config.persistence);
    assert_eq!(store.path(), snapshot.as_path());

    let engine = MemoryEngine::new(config.memory);
    engine.add("x", "y", Judgment::Neutral, RegretScores::fallback(), Emotion::Neutral, None);
    engine.save(&store).expect("save");
    assert!(snapshot.exists());
}

#[test]
fn reset_keeps_id_counter_across_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::new(dir.path().join("graph.bin"), true);
    let engine = scenario_engine();
    engine.reset();
    engine.save(&store).expect("save");

    let restored = MemoryEngine::default();
    assert!(restored.load(&store));
    assert!(restored.is_empty());
    let id = restored.add("fresh", "r", Judgment::Good, RegretScores::fallback(), Emotion::Neutral, None);
    assert_eq!(id, NodeId(4));
}
