//! Betweenness centrality (Brandes, 2001) over the directed memory graph.
//!
//! For every source `s` a BFS counts shortest paths `σ(s, v)` and records
//! predecessors; a reverse sweep in order of non-increasing distance then
//! accumulates dependencies:
//!
//! ```text
//! δ(s, v) = Σ_{w : v ∈ P(w)} σ(s, v) / σ(s, w) · (1 + δ(s, w))
//! C_B(v)  = Σ_{s ≠ v} δ(s, v)
//! ```
//!
//! Scores are normalized by `1 / ((n - 1)(n - 2))` for `n > 2`, so a value
//! is the fraction of ordered node pairs whose shortest paths run through
//! the node. Graphs with two or fewer nodes score zero everywhere.
//!
//! Cost is `O(V·E)` time and `O(V + E)` space per source.

use std::collections::{HashMap, VecDeque};

use crate::graph::MemoryGraph;
use crate::types::NodeId;

/// Normalized betweenness centrality of every node.
#[must_use]
pub fn betweenness(graph: &MemoryGraph) -> HashMap<NodeId, f64> {
    let ids: Vec<NodeId> = graph.node_ids().collect();
    let n = ids.len();
    let index: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    // Dense adjacency by index keeps the inner loops free of map lookups.
    let adjacency: Vec<Vec<usize>> = ids
        .iter()
        .map(|&id| graph.successors(id).filter_map(|s| index.get(&s).copied()).collect())
        .collect();

    let mut centrality = vec![0.0_f64; n];
    let mut stack: Vec<usize> = Vec::with_capacity(n);
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0_f64; n];
    let mut dist = vec![-1_i64; n];
    let mut delta = vec![0.0_f64; n];
    let mut queue = VecDeque::with_capacity(n);

    for s in 0..n {
        stack.clear();
        for p in &mut preds {
            p.clear();
        }
        sigma.fill(0.0);
        dist.fill(-1);
        delta.fill(0.0);

        sigma[s] = 1.0;
        dist[s] = 0;
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &adjacency[v] {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    if n > 2 {
        #[allow(clippy::cast_precision_loss)]
        let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
        for c in &mut centrality {
            *c *= scale;
        }
    }

    ids.into_iter().zip(centrality).collect()
}
