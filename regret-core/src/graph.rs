//! The memory graph — nodes keyed by id plus forward and reverse adjacency.
//!
//! ```text
//!   nodes         NodeId → MemoryNode
//!   successors    NodeId → {NodeId}     (out-edges)
//!   predecessors  NodeId → {NodeId}     (in-edges)
//! ```
//!
//! Every node has an entry in both adjacency maps, so an edge can never
//! dangle: [`MemoryGraph::remove_node`] strips the node from its
//! neighbours' sets before dropping its own.
//!
//! Ordered maps keep iteration (and therefore centrality, clustering and
//! snapshots) deterministic.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RegretError, Result};
use crate::types::{Emotion, Judgment, MemoryNode, NodeId, RegretScores};

/// Largest id counter a graph accepts. Snapshots claiming more are
/// rejected, which keeps [`MemoryGraph::add`] clear of `u64` overflow.
pub const MAX_NODE_ID: u64 = u64::MAX >> 1;

/// Directed graph of memory nodes joined by causal edges.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryGraph {
    nodes: BTreeMap<NodeId, MemoryNode>,
    successors: BTreeMap<NodeId, BTreeSet<NodeId>>,
    predecessors: BTreeMap<NodeId, BTreeSet<NodeId>>,
    next_id: u64,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraph {
    /// Create an empty graph whose first node will get id 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
            next_id: 1,
        }
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Record an interaction and chain it after the most recent surviving node.
    ///
    /// `timestamp` defaults to now. Inputs are assumed valid; the score
    /// type already guarantees its range.
    pub fn add(
        &mut self,
        prompt: impl Into<String>,
        response: impl Into<String>,
        judgment: Judgment,
        regret_scores: RegretScores,
        emotion: Emotion,
        timestamp: Option<DateTime<Utc>>,
    ) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        let previous = self.latest();
        let node = MemoryNode {
            id,
            prompt: prompt.into(),
            response: response.into(),
            judgment,
            regret_scores,
            emotion,
            created_at: timestamp.unwrap_or_else(Utc::now),
            residual_regret: regret_scores.overall_regret(),
        };
        self.insert_node(node);

        if let Some(prev) = previous {
            self.insert_edge(prev, id);
        }

        info!(
            node = %id,
            regret = format_args!("{:.2}", regret_scores.overall_regret()),
            %judgment,
            %emotion,
            "Added memory node"
        );
        id
    }

    /// Add a directed edge between two existing nodes.
    ///
    /// Returns `false` if the edge was already present.
    ///
    /// # Errors
    /// [`RegretError::NodeNotFound`] if either endpoint is missing,
    /// [`RegretError::Validation`] for a self-loop.
    pub fn link(&mut self, from: NodeId, to: NodeId) -> Result<bool> {
        if from == to {
            return Err(RegretError::Validation(format!("self-loop on node {from}")));
        }
        for id in [from, to] {
            if !self.nodes.contains_key(&id) {
                return Err(RegretError::NodeNotFound(id));
            }
        }
        let inserted = self.insert_edge(from, to);
        if inserted {
            debug!(%from, %to, "Linked memory nodes");
        }
        Ok(inserted)
    }

    fn insert_node(&mut self, node: MemoryNode) {
        let id = node.id;
        self.nodes.insert(id, node);
        self.successors.entry(id).or_default();
        self.predecessors.entry(id).or_default();
    }

    fn insert_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        let inserted = self.successors.entry(from).or_default().insert(to);
        self.predecessors.entry(to).or_default().insert(from);
        inserted
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Remove a node together with every incident edge.
    pub fn remove_node(&mut self, id: NodeId) -> Option<MemoryNode> {
        let node = self.nodes.remove(&id)?;
        for succ in self.successors.remove(&id).unwrap_or_default() {
            if let Some(preds) = self.predecessors.get_mut(&succ) {
                preds.remove(&id);
            }
        }
        for pred in self.predecessors.remove(&id).unwrap_or_default() {
            if let Some(succs) = self.successors.get_mut(&pred) {
                succs.remove(&id);
            }
        }
        Some(node)
    }

    /// Drop every node and edge. The id counter keeps counting.
    pub fn clear(&mut self) {
        let dropped = self.nodes.len();
        self.nodes.clear();
        self.successors.clear();
        self.predecessors.clear();
        info!(dropped, next_id = self.next_id, "Memory graph reset");
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Look up a node.
    ///
    /// # Errors
    /// [`RegretError::NodeNotFound`] if the id is unknown.
    pub fn node(&self, id: NodeId) -> Result<&MemoryNode> {
        self.nodes.get(&id).ok_or(RegretError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode> {
        self.nodes.get_mut(&id).ok_or(RegretError::NodeNotFound(id))
    }

    /// Whether the graph holds `id`.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &MemoryNode> {
        self.nodes.values()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut MemoryNode> {
        self.nodes.values_mut()
    }

    /// All node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// All edges as `(from, to)` pairs, ordered by `from` then `to`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.successors
            .iter()
            .flat_map(|(&from, tos)| tos.iter().map(move |&to| (from, to)))
    }

    /// Out-neighbours of `id` (empty for unknown ids).
    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.successors.get(&id).into_iter().flatten().copied()
    }

    /// In-neighbours of `id` (empty for unknown ids).
    pub fn predecessors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.predecessors.get(&id).into_iter().flatten().copied()
    }

    /// In-degree plus out-degree.
    #[must_use]
    pub fn degree(&self, id: NodeId) -> usize {
        self.successors.get(&id).map_or(0, BTreeSet::len)
            + self.predecessors.get(&id).map_or(0, BTreeSet::len)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of directed edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.successors.values().map(BTreeSet::len).sum()
    }

    /// The id the next [`add`](Self::add) will assign.
    #[must_use]
    pub fn next_id(&self) -> NodeId {
        NodeId(self.next_id)
    }

    /// Most recently added node still in the graph.
    #[must_use]
    pub fn latest(&self) -> Option<NodeId> {
        self.nodes.keys().next_back().copied()
    }

    /// Mean overall regret across all nodes; 0 for an empty graph.
    #[must_use]
    pub fn average_regret(&self) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.nodes.len() as f64;
        self.nodes.values().map(MemoryNode::overall_regret).sum::<f64>() / count
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Flat, serializable view of the whole graph.
    ///
    /// Nodes whose overall regret exceeds `high_regret_marker` are flagged.
    #[must_use]
    pub fn export(&self, high_regret_marker: f64) -> GraphExport {
        let nodes = self
            .nodes
            .values()
            .map(|n| {
                let overall_regret = n.overall_regret();
                NodeView {
                    id: n.id,
                    prompt: n.prompt.clone(),
                    response: n.response.clone(),
                    judgment: n.judgment,
                    regret_scores: n.regret_scores,
                    emotion: n.emotion,
                    timestamp: n.created_at,
                    overall_regret,
                    residual_regret: n.residual_regret,
                    high_regret: overall_regret > high_regret_marker,
                }
            })
            .collect();
        GraphExport {
            nodes,
            edges: self.edges().collect(),
        }
    }

    // ------------------------------------------------------------------
    // Snapshot support
    // ------------------------------------------------------------------

    /// Rebuild a graph from raw parts, rejecting anything inconsistent.
    pub(crate) fn from_parts(
        next_id: u64,
        nodes: Vec<MemoryNode>,
        edges: Vec<(NodeId, NodeId)>,
    ) -> Result<Self> {
        if next_id == 0 || next_id > MAX_NODE_ID {
            return Err(RegretError::Serialization(format!(
                "id counter {next_id} outside 1..={MAX_NODE_ID}"
            )));
        }
        let mut graph = Self::new();
        for node in nodes {
            if node.id.0 == 0 || node.id.0 >= next_id {
                return Err(RegretError::Serialization(format!(
                    "node id {} outside issued range 1..{next_id}",
                    node.id
                )));
            }
            if graph.nodes.contains_key(&node.id) {
                return Err(RegretError::Serialization(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
            graph.insert_node(node);
        }
        for (from, to) in edges {
            if from == to || !graph.contains(from) || !graph.contains(to) {
                return Err(RegretError::Serialization(format!(
                    "invalid edge {from} -> {to}"
                )));
            }
            graph.insert_edge(from, to);
        }
        graph.next_id = next_id;
        Ok(graph)
    }

    pub(crate) fn raw_next_id(&self) -> u64 {
        self.next_id
    }
}

/// Serializable graph export: every node with all attributes, plus edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    /// Nodes in id order.
    pub nodes: Vec<NodeView>,
    /// Directed `(from, to)` pairs.
    pub edges: Vec<(NodeId, NodeId)>,
}

/// One node as exported to the service shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    /// Node id.
    pub id: NodeId,
    /// Stored prompt.
    pub prompt: String,
    /// Stored response.
    pub response: String,
    /// Judge verdict.
    pub judgment: Judgment,
    /// Current criteria.
    pub regret_scores: RegretScores,
    /// Emotion at insertion.
    pub emotion: Emotion,
    /// Insertion time (RFC 3339).
    pub timestamp: DateTime<Utc>,
    /// Derived overall regret.
    pub overall_regret: f64,
    /// Time-decayed regret.
    pub residual_regret: f64,
    /// Overall regret above the configured marker.
    pub high_regret: bool,
}
