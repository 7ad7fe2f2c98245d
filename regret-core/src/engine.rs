//! The memory engine — process-lifetime graph state behind one lock.
//!
//! ```text
//!            ┌──────────────── RwLock<MemoryGraph> ────────────────┐
//!  write ──► │ add · record · link · causal_forgetting · feedback │
//!            │ decay_residual_regret · reset · load (swap)         │
//!  read  ──► │ analyze_clusters · check_past_regrets · export      │
//!            │ mood · node · len · save (encode)                   │
//!            └─────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation runs under the exclusive lock, so two concurrent `add`s can
//! never draw the same id or interleave edge insertion. Readers share the
//! lock and always observe a whole graph. Centrality is computed under the
//! write lock during forgetting; that is fine at hundreds to low thousands
//! of nodes.
//!
//! Snapshot loads decode and validate outside the lock and swap the graph in
//! only on success.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use crate::community::{self, ClusterReport};
use crate::config::MemoryConfig;
use crate::emotion::derive_mood;
use crate::error::Result;
use crate::feedback;
use crate::forgetting::{self, ForgettingPolicy};
use crate::graph::{GraphExport, MemoryGraph};
use crate::metrics::{CounterSnapshot, EngineCounters};
use crate::recall;
use crate::snapshot::SnapshotStore;
use crate::types::{Emotion, Judgment, MemoryNode, NodeId, RegretScores};

/// Outcome of [`MemoryEngine::record`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recorded {
    /// Id assigned to the new node.
    pub node_id: NodeId,
    /// Overall regret of the new node.
    pub overall_regret: f64,
    /// Emotion stored with the node.
    pub emotion: Emotion,
    /// Mood after the insertion.
    pub mood: u8,
}

/// Shared handle to the memory graph.
#[derive(Debug)]
pub struct MemoryEngine {
    graph: RwLock<MemoryGraph>,
    config: MemoryConfig,
    counters: EngineCounters,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl MemoryEngine {
    /// An engine over an empty graph.
    #[must_use]
    pub fn new(config: MemoryConfig) -> Self {
        Self::with_graph(MemoryGraph::new(), config)
    }

    /// An engine over an existing graph.
    #[must_use]
    pub fn with_graph(graph: MemoryGraph, config: MemoryConfig) -> Self {
        Self {
            graph: RwLock::new(graph),
            config,
            counters: EngineCounters::new(),
        }
    }

    /// The memory thresholds this engine was built with.
    #[must_use]
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Mutations (exclusive lock)
    // ------------------------------------------------------------------

    /// Insert a node chained after the latest one. See [`MemoryGraph::add`].
    pub fn add(
        &self,
        prompt: impl Into<String>,
        response: impl Into<String>,
        judgment: Judgment,
        regret_scores: RegretScores,
        emotion: Emotion,
        timestamp: Option<DateTime<Utc>>,
    ) -> NodeId {
        let id = self
            .graph
            .write()
            .add(prompt, response, judgment, regret_scores, emotion, timestamp);
        EngineCounters::bump(&self.counters.nodes_added, 1);
        id
    }

    /// Insert a node and recompute the mood in one critical section.
    pub fn record(
        &self,
        prompt: impl Into<String>,
        response: impl Into<String>,
        judgment: Judgment,
        regret_scores: RegretScores,
        emotion: Emotion,
    ) -> Recorded {
        let mut graph = self.graph.write();
        let node_id = graph.add(prompt, response, judgment, regret_scores, emotion, None);
        let mood = derive_mood(graph.average_regret(), self.config.mood_threshold);
        drop(graph);

        EngineCounters::bump(&self.counters.nodes_added, 1);
        Recorded {
            node_id,
            overall_regret: regret_scores.overall_regret(),
            emotion,
            mood,
        }
    }

    /// Add a directed edge. See [`MemoryGraph::link`].
    ///
    /// # Errors
    /// [`crate::RegretError::NodeNotFound`] or [`crate::RegretError::Validation`].
    pub fn link(&self, from: NodeId, to: NodeId) -> Result<bool> {
        self.graph.write().link(from, to)
    }

    /// Forget low-regret memories that are stale, peripheral or orphaned,
    /// measuring age against the current time.
    pub fn causal_forgetting(&self, regret_threshold: f64, age_days_threshold: i64) -> usize {
        let policy = ForgettingPolicy {
            regret_threshold,
            age_days_threshold,
        };
        self.causal_forgetting_at(&policy, Utc::now())
    }

    /// [`causal_forgetting`](Self::causal_forgetting) with the configured
    /// thresholds.
    pub fn forget(&self) -> usize {
        self.causal_forgetting(self.config.regret_threshold, self.config.age_days_threshold)
    }

    /// Forgetting pass against an explicit clock.
    pub fn causal_forgetting_at(&self, policy: &ForgettingPolicy, now: DateTime<Utc>) -> usize {
        let removed = forgetting::causal_forgetting(&mut self.graph.write(), policy, now);
        EngineCounters::bump(&self.counters.forgetting_passes, 1);
        EngineCounters::bump(&self.counters.nodes_forgotten, removed as u64);
        removed
    }

    /// Apply a human rating. See [`feedback::feedback_adjust`].
    ///
    /// # Errors
    /// [`crate::RegretError::Validation`] for a rating outside `1..=10`,
    /// [`crate::RegretError::NodeNotFound`] for an unknown node.
    pub fn feedback_adjust(&self, id: NodeId, rating: u8) -> Result<RegretScores> {
        let scores = feedback::feedback_adjust(&mut self.graph.write(), id, rating)?;
        EngineCounters::bump(&self.counters.feedback_applied, 1);
        Ok(scores)
    }

    /// Decay every node's residual regret by the configured per-day rate.
    pub fn decay_residual_regret(&self, now: DateTime<Utc>) -> usize {
        forgetting::decay_residual_regret(&mut self.graph.write(), self.config.forgetting_decay, now)
    }

    /// Drop every node and edge. Ids keep counting.
    pub fn reset(&self) {
        self.graph.write().clear();
    }

    // ------------------------------------------------------------------
    // Queries (shared lock)
    // ------------------------------------------------------------------

    /// Community summary of the current graph.
    #[must_use]
    pub fn analyze_clusters(&self) -> ClusterReport {
        community::analyze_clusters(&self.graph.read())
    }

    /// Whether `prompt` resembles a memory regretted above `regret_threshold`.
    #[must_use]
    pub fn check_past_regrets(&self, prompt: &str, regret_threshold: f64) -> bool {
        recall::check_past_regrets(&self.graph.read(), prompt, regret_threshold)
    }

    /// Full node and edge listing, flagging high-regret nodes.
    #[must_use]
    pub fn export(&self) -> GraphExport {
        self.graph.read().export(self.config.high_regret_marker)
    }

    /// Current mood from the average regret of all memories.
    #[must_use]
    pub fn mood(&self) -> u8 {
        derive_mood(self.graph.read().average_regret(), self.config.mood_threshold)
    }

    /// Copy of a node.
    ///
    /// # Errors
    /// [`crate::RegretError::NodeNotFound`] if the id is unknown.
    pub fn node(&self, id: NodeId) -> Result<MemoryNode> {
        self.graph.read().node(id).cloned()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.read().len()
    }

    /// Whether the graph is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.read().is_empty()
    }

    /// Run `f` against a consistent view of the graph.
    pub fn read<R>(&self, f: impl FnOnce(&MemoryGraph) -> R) -> R {
        f(&self.graph.read())
    }

    /// Counter values since startup.
    #[must_use]
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Persist the whole graph. Returns the bytes written.
    ///
    /// # Errors
    /// [`crate::RegretError::Serialization`] or [`crate::RegretError::Io`].
    pub fn save(&self, store: &SnapshotStore) -> Result<usize> {
        let bytes = store.save(&self.graph.read())?;
        EngineCounters::bump(&self.counters.snapshots_saved, 1);
        Ok(bytes)
    }

    /// Replace the graph with the snapshot, returning the restored node count.
    ///
    /// The live graph is untouched if the snapshot cannot be read or fails
    /// validation.
    ///
    /// # Errors
    /// [`crate::RegretError::Io`] or [`crate::RegretError::Serialization`].
    pub fn try_load(&self, store: &SnapshotStore) -> Result<usize> {
        let loaded = store.load().inspect_err(|_| {
            EngineCounters::bump(&self.counters.snapshots_rejected, 1);
        })?;
        let nodes = loaded.len();
        *self.graph.write() = loaded;
        EngineCounters::bump(&self.counters.snapshots_loaded, 1);
        info!(path = %store.path().display(), nodes, "Restored memory graph");
        Ok(nodes)
    }

    /// [`try_load`](Self::try_load) reduced to success or failure.
    pub fn load(&self, store: &SnapshotStore) -> bool {
        match self.try_load(store) {
            Ok(_) => true,
            Err(e) => {
                warn!(path = %store.path().display(), error = %e, "Snapshot load rejected, keeping current graph");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn scores(e: f64, f: f64, x: f64) -> RegretScores {
        RegretScores::new(e, f, x).expect("valid scores")
    }

    #[test]
    fn record_returns_mood_after_insert() {
        let engine = MemoryEngine::default();
        let first = engine.record("hi", "hello", Judgment::Good, scores(1.0, 10.0, 10.0), Emotion::Happy);
        assert_eq!(first.node_id, NodeId(1));
        // avg 0.33 ≤ 5 → 6 + 0
        assert_eq!(first.mood, 6);

        let second = engine.record("bad", "no", Judgment::Bad, scores(10.0, 1.0, 1.0), Emotion::Angry);
        assert_eq!(second.node_id, NodeId(2));
        assert!((second.overall_regret - 28.0 / 3.0).abs() < 1e-9);
        // avg (1/3 + 28/3) / 2 ≈ 4.83 → 6 + 4
        assert_eq!(second.mood, 10);
        assert_eq!(engine.mood(), 10);
        assert_eq!(engine.counters().nodes_added, 2);
    }

    #[test]
    fn empty_engine_mood_uses_zero_average() {
        assert_eq!(MemoryEngine::default().mood(), 6);
    }

    #[test]
    fn concurrent_adds_get_distinct_ids() {
        let engine = Arc::new(MemoryEngine::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|i| {
                            engine.add(
                                format!("t{t} p{i}"),
                                "r",
                                Judgment::Neutral,
                                RegretScores::fallback(),
                                Emotion::Neutral,
                                None,
                            )
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<NodeId> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread"))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(engine.len(), 200);
        assert_eq!(engine.read(MemoryGraph::edge_count), 199);
    }

    #[test]
    fn failed_load_keeps_graph() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = MemoryEngine::default();
        engine.add("keep me", "ok", Judgment::Good, scores(2.0, 8.0, 8.0), Emotion::Happy, None);

        let missing = SnapshotStore::new(dir.path().join("missing.bin"), true);
        assert!(!engine.load(&missing));

        let garbage = dir.path().join("garbage.bin");
        std::fs::write(&garbage, b"RGRF\x01\x00\x01garbage").expect("write");
        assert!(!engine.load(&SnapshotStore::new(&garbage, true)));

        assert_eq!(engine.len(), 1);
        assert_eq!(engine.node(NodeId(1)).expect("node").prompt, "keep me");
        assert_eq!(engine.counters().snapshots_rejected, 2);
    }

    #[test]
    fn save_then_load_restores_graph() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path().join("graph.bin"), true);

        let source = MemoryEngine::default();
        source.add("a", "r", Judgment::Good, scores(2.0, 8.0, 8.0), Emotion::Happy, None);
        source.add("b", "r", Judgment::Bad, scores(9.0, 2.0, 2.0), Emotion::Angry, None);
        source.save(&store).expect("save");

        let target = MemoryEngine::default();
        assert!(target.load(&store));
        assert_eq!(target.export(), source.export());
        // The id counter travels with the snapshot.
        let next = target.add("c", "r", Judgment::Neutral, RegretScores::fallback(), Emotion::Neutral, None);
        assert_eq!(next, NodeId(3));
    }

    #[test]
    fn feedback_and_reset_go_through_the_lock() {
        let engine = MemoryEngine::default();
        let id = engine.add("a", "r", Judgment::Neutral, RegretScores::fallback(), Emotion::Neutral, None);
        let after = engine.feedback_adjust(id, 10).expect("feedback");
        assert_eq!(after.ethical_regret(), 2.5);
        assert!(engine.feedback_adjust(NodeId(9), 5).is_err());
        assert_eq!(engine.counters().feedback_applied, 1);

        engine.reset();
        assert!(engine.is_empty());
        assert_eq!(engine.analyze_clusters(), ClusterReport::NotEnoughNodes);
    }
}
