//! Snapshot store — whole-graph save/load to a single binary file.
//!
//! ```text
//! ┌────────┬─────────┬───────┬────────┬──────────────────────────────┐
//! │ "RGRF" │ version │ flags │ crc32  │ bincode(GraphSnapshot)       │
//! │ 4 B    │ u16 LE  │ u8    │ u32 LE │ next_id, nodes[], edges[]    │
//! └────────┴─────────┴───────┴────────┴──────────────────────────────┘
//! ```
//!
//! - The CRC-32 covers the payload and is only checked when the checksum
//!   flag is set.
//! - Timestamps travel as RFC 3339 strings.
//! - Saves write a sibling `.tmp` file and rename it over the target, so a
//!   crash mid-write never leaves a truncated snapshot behind.
//! - Decoding builds a fresh graph and validates it completely; callers
//!   swap it in only on success.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PersistenceConfig;
use crate::error::{RegretError, Result};
use crate::graph::MemoryGraph;
use crate::types::{MemoryNode, NodeId};

/// File signature.
pub const MAGIC: [u8; 4] = *b"RGRF";
/// Current on-disk format version.
pub const FORMAT_VERSION: u16 = 1;

const FLAG_CHECKSUM: u8 = 0b0000_0001;
const HEADER_LEN: usize = 4 + 2 + 1 + 4;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    next_id: u64,
    nodes: Vec<&'a MemoryNode>,
    edges: Vec<(NodeId, NodeId)>,
}

#[derive(Deserialize)]
struct GraphSnapshot {
    next_id: u64,
    nodes: Vec<MemoryNode>,
    edges: Vec<(NodeId, NodeId)>,
}

/// Serialize a graph into a snapshot blob.
///
/// # Errors
/// [`RegretError::Serialization`] if bincode encoding fails.
pub fn encode(graph: &MemoryGraph, checksum: bool) -> Result<Vec<u8>> {
    let snapshot = SnapshotRef {
        next_id: graph.raw_next_id(),
        nodes: graph.nodes().collect(),
        edges: graph.edges().collect(),
    };
    let payload = bincode::serialize(&snapshot)?;

    let (flags, crc) = if checksum {
        (FLAG_CHECKSUM, crc32fast::hash(&payload))
    } else {
        (0, 0)
    };

    let mut blob = Vec::with_capacity(HEADER_LEN + payload.len());
    blob.extend_from_slice(&MAGIC);
    blob.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    blob.push(flags);
    blob.extend_from_slice(&crc.to_le_bytes());
    blob.extend_from_slice(&payload);
    Ok(blob)
}

/// Rebuild a graph from a snapshot blob.
///
/// # Errors
/// [`RegretError::Serialization`] for a bad signature, unknown version,
/// checksum mismatch, undecodable payload or an inconsistent graph.
pub fn decode(blob: &[u8]) -> Result<MemoryGraph> {
    if blob.len() < HEADER_LEN {
        return Err(RegretError::Serialization(format!(
            "snapshot truncated: {} bytes",
            blob.len()
        )));
    }
    let (header, payload) = blob.split_at(HEADER_LEN);
    if header[..4] != MAGIC {
        return Err(RegretError::Serialization("not a regret graph snapshot".into()));
    }
    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != FORMAT_VERSION {
        return Err(RegretError::Serialization(format!(
            "unsupported snapshot version {version} (expected {FORMAT_VERSION})"
        )));
    }
    let flags = header[6];
    let stored_crc = u32::from_le_bytes([header[7], header[8], header[9], header[10]]);
    if flags & FLAG_CHECKSUM != 0 {
        let actual = crc32fast::hash(payload);
        if actual != stored_crc {
            return Err(RegretError::Serialization(format!(
                "checksum mismatch: stored {stored_crc:08x}, computed {actual:08x}"
            )));
        }
    }

    let snapshot: GraphSnapshot = bincode::deserialize(payload)?;
    MemoryGraph::from_parts(snapshot.next_id, snapshot.nodes, snapshot.edges)
}

// ---------------------------------------------------------------------------
// SnapshotStore
// ---------------------------------------------------------------------------

/// A snapshot file on disk.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    checksum_enabled: bool,
}

impl SnapshotStore {
    /// A store writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, checksum_enabled: bool) -> Self {
        Self {
            path: path.into(),
            checksum_enabled,
        }
    }

    /// A store configured from `[persistence]`.
    #[must_use]
    pub fn from_config(config: &PersistenceConfig) -> Self {
        Self::new(&config.snapshot_path, config.checksum_enabled)
    }

    /// Snapshot file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole graph, replacing any previous snapshot.
    /// Returns the number of bytes written.
    ///
    /// # Errors
    /// [`RegretError::Serialization`] on encoding failure, [`RegretError::Io`]
    /// if the file cannot be written.
    pub fn save(&self, graph: &MemoryGraph) -> Result<usize> {
        let start = Instant::now();
        let blob = encode(graph, self.checksum_enabled)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.tmp_path();
        std::fs::write(&tmp, &blob)?;
        std::fs::rename(&tmp, &self.path)?;

        info!(
            path = %self.path.display(),
            nodes = graph.len(),
            edges = graph.edge_count(),
            bytes = blob.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved graph snapshot"
        );
        Ok(blob.len())
    }

    /// Read and validate the snapshot.
    ///
    /// # Errors
    /// [`RegretError::Io`] if the file is missing or unreadable,
    /// [`RegretError::Serialization`] if it is corrupt or incompatible.
    pub fn load(&self) -> Result<MemoryGraph> {
        let start = Instant::now();
        let blob = std::fs::read(&self.path)?;
        let graph = decode(&blob)?;
        debug!(
            path = %self.path.display(),
            nodes = graph.len(),
            edges = graph.edge_count(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded graph snapshot"
        );
        Ok(graph)
    }

    /// Path of the in-flight write (e.g. `graph.bin.tmp`).
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
