//! Community detection by greedy modularity maximisation
//! (Clauset, Newman & Moore, 2004).
//!
//! Works on the undirected projection of the memory graph: edge direction
//! is dropped and `u→v` / `v→u` collapse into one edge. Every node starts in
//! its own community; the pair of connected communities whose merge raises
//! modularity the most is merged, until the best merge would lower it.
//!
//! ```text
//! e_ij = (edges between i and j) / 2m      a_i = (degree of i) / 2m
//! ΔQ(i, j) = 2 · (e_ij − a_i · a_j)
//! ```
//!
//! Ties break toward the lowest community index, which makes the result
//! deterministic for a given graph but not canonical: a different heuristic
//! could return a different partition of equal modularity.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::graph::MemoryGraph;
use crate::types::NodeId;

/// Partition the graph into communities, largest first.
///
/// Members of each community are in ascending id order; equally sized
/// communities are ordered by their smallest member.
#[must_use]
pub fn greedy_modularity_communities(graph: &MemoryGraph) -> Vec<Vec<NodeId>> {
    let ids: Vec<NodeId> = graph.node_ids().collect();
    let index: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    let undirected: BTreeSet<(usize, usize)> = graph
        .edges()
        .filter_map(|(from, to)| {
            let (u, v) = (*index.get(&from)?, *index.get(&to)?);
            (u != v).then(|| (u.min(v), u.max(v)))
        })
        .collect();

    let mut members: Vec<Option<Vec<usize>>> = (0..ids.len()).map(|i| Some(vec![i])).collect();

    if !undirected.is_empty() {
        #[allow(clippy::cast_precision_loss)]
        let two_m = 2.0 * undirected.len() as f64;
        let mut a = vec![0.0_f64; ids.len()];
        let mut e: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); ids.len()];
        for &(u, v) in &undirected {
            a[u] += 1.0 / two_m;
            a[v] += 1.0 / two_m;
            *e[u].entry(v).or_default() += 1.0 / two_m;
            *e[v].entry(u).or_default() += 1.0 / two_m;
        }

        loop {
            let best = e
                .iter()
                .enumerate()
                .flat_map(|(i, row)| {
                    let a = &a;
                    row.iter()
                        .filter(move |&(&j, _)| j > i)
                        .map(move |(&j, &e_ij)| (2.0 * (e_ij - a[i] * a[j]), i, j))
                })
                .max_by_key(|&(dq, i, j)| (OrderedFloat(dq), Reverse(i), Reverse(j)));

            let Some((dq, i, j)) = best else { break };
            if dq < 0.0 {
                break;
            }

            // Fold community j into community i.
            let absorbed = members[j].take().unwrap_or_default();
            if let Some(target) = members[i].as_mut() {
                target.extend(absorbed);
            }
            a[i] += a[j];
            a[j] = 0.0;

            let row_j = std::mem::take(&mut e[j]);
            e[i].remove(&j);
            for (k, e_jk) in row_j {
                if k == i {
                    continue;
                }
                e[k].remove(&j);
                *e[i].entry(k).or_default() += e_jk;
                *e[k].entry(i).or_default() += e_jk;
            }
        }
    }

    let mut communities: Vec<Vec<NodeId>> = members
        .into_iter()
        .flatten()
        .map(|group| {
            let mut group: Vec<NodeId> = group.into_iter().map(|i| ids[i]).collect();
            group.sort_unstable();
            group
        })
        .collect();
    communities.sort_by(|x, y| y.len().cmp(&x.len()).then_with(|| x.first().cmp(&y.first())));
    communities
}

// ---------------------------------------------------------------------------
// Cluster report
// ---------------------------------------------------------------------------

/// One detected community.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Member node ids, ascending.
    pub members: Vec<NodeId>,
    /// Number of members.
    pub size: usize,
    /// Mean overall regret of the members.
    pub mean_overall_regret: f64,
}

/// Result of [`analyze_clusters`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClusterReport {
    /// Fewer than two nodes; clustering was not attempted.
    NotEnoughNodes,
    /// The detected communities, largest first.
    Clusters {
        /// Communities with their sizes and mean regret.
        clusters: Vec<Cluster>,
    },
}

impl ClusterReport {
    /// Number of communities (zero for the sentinel).
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::NotEnoughNodes => 0,
            Self::Clusters { clusters } => clusters.len(),
        }
    }

    /// Community sizes, largest first.
    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        match self {
            Self::NotEnoughNodes => Vec::new(),
            Self::Clusters { clusters } => clusters.iter().map(|c| c.size).collect(),
        }
    }
}

impl fmt::Display for ClusterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEnoughNodes => write!(f, "Not enough nodes for clustering."),
            Self::Clusters { clusters } => {
                write!(f, "Found {} clusters. Sizes: {:?}", clusters.len(), self.sizes())?;
                for (i, cluster) in clusters.iter().enumerate() {
                    write!(
                        f,
                        " | Cluster {}: {} nodes, avg regret {:.1}",
                        i + 1,
                        cluster.size,
                        cluster.mean_overall_regret
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// Detect communities and summarise each one's size and mean regret.
#[must_use]
pub fn analyze_clusters(graph: &MemoryGraph) -> ClusterReport {
    if graph.len() < 2 {
        return ClusterReport::NotEnoughNodes;
    }
    let clusters = greedy_modularity_communities(graph)
        .into_iter()
        .map(|members| {
            let total: f64 = members
                .iter()
                .filter_map(|&id| graph.node(id).ok())
                .map(crate::types::MemoryNode::overall_regret)
                .sum();
            #[allow(clippy::cast_precision_loss)]
            let mean_overall_regret = total / members.len() as f64;
            Cluster {
                size: members.len(),
                members,
                mean_overall_regret,
            }
        })
        .collect();
    ClusterReport::Clusters { clusters }
}
