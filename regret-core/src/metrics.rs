//! Runtime counters for the memory engine.
//!
//! Lock-free `AtomicU64` counters bumped on the mutation paths and read
//! when the console or a dashboard asks for them. Counts are since process
//! start; they are not persisted in snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters for engine events.
#[derive(Debug)]
pub struct EngineCounters {
    /// Nodes added since startup.
    pub nodes_added: AtomicU64,
    /// Nodes removed by causal forgetting.
    pub nodes_forgotten: AtomicU64,
    /// Feedback ratings applied.
    pub feedback_applied: AtomicU64,
    /// Forgetting passes run.
    pub forgetting_passes: AtomicU64,
    /// Snapshots written.
    pub snapshots_saved: AtomicU64,
    /// Snapshots loaded and swapped in.
    pub snapshots_loaded: AtomicU64,
    /// Snapshot loads that failed validation or I/O.
    pub snapshots_rejected: AtomicU64,
}

impl EngineCounters {
    /// Zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes_added: AtomicU64::new(0),
            nodes_forgotten: AtomicU64::new(0),
            feedback_applied: AtomicU64::new(0),
            forgetting_passes: AtomicU64::new(0),
            snapshots_saved: AtomicU64::new(0),
            snapshots_loaded: AtomicU64::new(0),
            snapshots_rejected: AtomicU64::new(0),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    /// Read every counter.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            nodes_added: self.nodes_added.load(Ordering::Relaxed),
            nodes_forgotten: self.nodes_forgotten.load(Ordering::Relaxed),
            feedback_applied: self.feedback_applied.load(Ordering::Relaxed),
            forgetting_passes: self.forgetting_passes.load(Ordering::Relaxed),
            snapshots_saved: self.snapshots_saved.load(Ordering::Relaxed),
            snapshots_loaded: self.snapshots_loaded.load(Ordering::Relaxed),
            snapshots_rejected: self.snapshots_rejected.load(Ordering::Relaxed),
        }
    }
}

impl Default for EngineCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// Nodes added.
    pub nodes_added: u64,
    /// Nodes forgotten.
    pub nodes_forgotten: u64,
    /// Feedback ratings applied.
    pub feedback_applied: u64,
    /// Forgetting passes run.
    pub forgetting_passes: u64,
    /// Snapshots written.
    pub snapshots_saved: u64,
    /// Snapshots loaded.
    pub snapshots_loaded: u64,
    /// Snapshot loads rejected.
    pub snapshots_rejected: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus text exposition.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows = [
            ("regret_nodes_added_total", "Memory nodes added", self.nodes_added),
            ("regret_nodes_forgotten_total", "Memory nodes forgotten", self.nodes_forgotten),
            ("regret_feedback_applied_total", "Feedback ratings applied", self.feedback_applied),
            ("regret_forgetting_passes_total", "Causal forgetting passes", self.forgetting_passes),
            ("regret_snapshots_saved_total", "Snapshots written", self.snapshots_saved),
            ("regret_snapshots_loaded_total", "Snapshots loaded", self.snapshots_loaded),
            ("regret_snapshots_rejected_total", "Snapshot loads rejected", self.snapshots_rejected),
        ];
        let mut out = String::new();
        for (name, help, value) in rows {
            out.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n"
            ));
        }
        out
    }
}
