//! # RegretGraph Core Library
//!
//! A memory of AI interactions kept as a directed graph. Every interaction
//! (prompt, response, a three-criteria regret judgment and a derived
//! emotion) becomes a node chained after the one before it, and the graph
//! periodically forgets what no longer matters:
//!
//! - **Causal forgetting**: low-regret memories are pruned once they are
//!   stale, peripheral (low betweenness centrality) or orphaned.
//! - **Clusters**: greedy modularity communities with per-community regret.
//! - **Recall**: a keyword check against previously regretted prompts.
//! - **Feedback**: human ratings nudge stored scores.
//! - **Mood**: a 1–10 scalar derived from the average regret.
//! - **Snapshots**: the whole graph saved to and restored from one file.
//!
//! [`MemoryEngine`] wraps the graph in a lock and is what callers hold.
//!
//! ## Performance Contract
//!
//! Sized for hundreds to low thousands of nodes:
//! - Node insertion: O(log n)
//! - Betweenness centrality (forgetting): O(n·m)
//! - Greedy modularity (clusters): O(n² log n) worst case

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod centrality;
pub mod community;
pub mod config;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod forgetting;
pub mod graph;
pub mod metrics;
pub mod recall;
pub mod snapshot;
pub mod types;

pub use community::{Cluster, ClusterReport};
pub use config::{MemoryConfig, RegretConfig};
pub use emotion::{derive_emotion, derive_mood};
pub use engine::{MemoryEngine, Recorded};
pub use error::RegretError;
pub use forgetting::ForgettingPolicy;
pub use graph::{GraphExport, MAX_NODE_ID, MemoryGraph, NodeView};
pub use snapshot::SnapshotStore;
pub use types::*;
