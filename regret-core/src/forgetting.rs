//! Causal forgetting — eviction policy over the memory graph.
//!
//! A node is forgotten iff its overall regret is **below** the regret
//! threshold and at least one decay signal fires:
//!
//! ```text
//! forget(v) = regret(v) < θ_regret ∧ ( age(v) > θ_age               — temporal
//!                                    ∨ C_B(v) < 0.01               — structural
//!                                    ∨ deg_in(v) + deg_out(v) = 0 ) — orphaned
//! ```
//!
//! High-regret memories are always retained. A low-regret memory that
//! still bridges other memories survives as long as it is recent.
//!
//! Centrality is computed once over the whole graph, every candidate is
//! identified against that single snapshot, and only then are candidates
//! removed, so the outcome does not depend on removal order.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::centrality;
use crate::graph::MemoryGraph;
use crate::types::{NodeId, SCORE_MIN};

/// Betweenness below which a node no longer counts as a structural hub.
pub const STRUCTURAL_IMPORTANCE_FLOOR: f64 = 0.01;

/// Thresholds for one forgetting pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForgettingPolicy {
    /// Only nodes with overall regret strictly below this are candidates.
    pub regret_threshold: f64,
    /// Nodes strictly older than this many whole days are stale.
    pub age_days_threshold: i64,
}

impl Default for ForgettingPolicy {
    fn default() -> Self {
        Self {
            regret_threshold: 3.0,
            age_days_threshold: 7,
        }
    }
}

/// Why a node qualified for forgetting. Several reasons may hold at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForgetReasons {
    /// Older than the age threshold.
    pub stale: bool,
    /// Betweenness below [`STRUCTURAL_IMPORTANCE_FLOOR`].
    pub peripheral: bool,
    /// No incoming or outgoing edges.
    pub orphaned: bool,
}

impl ForgetReasons {
    fn any(self) -> bool {
        self.stale || self.peripheral || self.orphaned
    }
}

/// Identify every node the policy would forget, without touching the graph.
///
/// Returns an empty list for graphs with fewer than two nodes.
#[must_use]
pub fn forgetting_candidates(
    graph: &MemoryGraph,
    policy: &ForgettingPolicy,
    now: DateTime<Utc>,
) -> Vec<(NodeId, ForgetReasons)> {
    if graph.len() < 2 {
        return Vec::new();
    }

    let centrality = centrality::betweenness(graph);

    graph
        .nodes()
        .filter(|node| node.overall_regret() < policy.regret_threshold)
        .filter_map(|node| {
            let reasons = ForgetReasons {
                stale: node.age_days(now) > policy.age_days_threshold,
                peripheral: centrality.get(&node.id).copied().unwrap_or(0.0)
                    < STRUCTURAL_IMPORTANCE_FLOOR,
                orphaned: graph.degree(node.id) == 0,
            };
            reasons.any().then_some((node.id, reasons))
        })
        .collect()
}

/// Run one causal-forgetting pass and return how many nodes were removed.
pub fn causal_forgetting(
    graph: &mut MemoryGraph,
    policy: &ForgettingPolicy,
    now: DateTime<Utc>,
) -> usize {
    let candidates = forgetting_candidates(graph, policy, now);

    for (id, reasons) in &candidates {
        debug!(
            node = %id,
            stale = reasons.stale,
            peripheral = reasons.peripheral,
            orphaned = reasons.orphaned,
            "Forgetting memory node"
        );
        graph.remove_node(*id);
    }

    info!(
        removed = candidates.len(),
        remaining = graph.len(),
        regret_threshold = policy.regret_threshold,
        age_days_threshold = policy.age_days_threshold,
        "Pruned nodes via causal forgetting"
    );
    candidates.len()
}

// ---------------------------------------------------------------------------
// Residual regret decay
// ---------------------------------------------------------------------------

/// Linear residual-regret decay: `max(1, overall − rate × age_days)`.
#[must_use]
pub fn decayed_regret(overall_regret: f64, forgetting_decay: f64, age_days: i64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let lost = forgetting_decay * age_days as f64;
    (overall_regret - lost).max(SCORE_MIN)
}

/// Recompute the residual regret of every node at least one day old.
///
/// Idempotent for a fixed `now`. Returns how many residuals changed.
pub fn decay_residual_regret(
    graph: &mut MemoryGraph,
    forgetting_decay: f64,
    now: DateTime<Utc>,
) -> usize {
    let mut changed = 0;
    for node in graph.nodes_mut() {
        let age = node.age_days(now);
        if age < 1 {
            continue;
        }
        let residual = decayed_regret(node.overall_regret(), forgetting_decay, age);
        if (residual - node.residual_regret).abs() > f64::EPSILON {
            node.residual_regret = residual;
            changed += 1;
        }
    }
    debug!(changed, forgetting_decay, "Residual regret decay pass");
    changed
}
