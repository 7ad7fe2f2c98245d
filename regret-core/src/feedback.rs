//! Human feedback — the only way a node's scores change after insertion.
//!
//! A rating of 5 is neutral. Each point above or below shifts every
//! criterion by half a point toward "less regret" or "more regret":
//!
//! ```text
//! adj = (rating − 5) · 0.5
//! ethical_regret   −= adj
//! factual_accuracy += adj
//! emotional_impact += adj      (each clamped to [1, 10])
//! ```

use tracing::info;

use crate::error::{RegretError, Result};
use crate::graph::MemoryGraph;
use crate::types::{NodeId, RegretScores};

/// Lowest accepted rating.
pub const RATING_MIN: u8 = 1;
/// Highest accepted rating.
pub const RATING_MAX: u8 = 10;

/// Score shift for a rating.
#[must_use]
pub fn adjustment(rating: u8) -> f64 {
    (f64::from(rating) - 5.0) * 0.5
}

/// Apply a human rating to a node and return the adjusted scores.
///
/// The node's residual regret is reset to its new overall regret.
///
/// # Errors
/// [`RegretError::Validation`] if `rating` is outside `1..=10` (checked before
/// the lookup), [`RegretError::NodeNotFound`] if the node does not exist.
pub fn feedback_adjust(graph: &mut MemoryGraph, id: NodeId, rating: u8) -> Result<RegretScores> {
    if !(RATING_MIN..=RATING_MAX).contains(&rating) {
        return Err(RegretError::Validation(format!(
            "rating must be within {RATING_MIN}..={RATING_MAX}, got {rating}"
        )));
    }
    let node = graph.node_mut(id)?;
    let adj = adjustment(rating);
    let before = node.regret_scores;
    let after = RegretScores::clamped(
        before.ethical_regret() - adj,
        before.factual_accuracy() + adj,
        before.emotional_impact() + adj,
    );
    node.regret_scores = after;
    node.residual_regret = after.overall_regret();

    info!(
        node = %id,
        rating,
        before = format_args!("{:.2}", before.overall_regret()),
        after = format_args!("{:.2}", after.overall_regret()),
        "Applied feedback"
    );
    Ok(after)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Emotion, Judgment};

    fn one_node(scores: RegretScores) -> (MemoryGraph, NodeId) {
        let mut graph = MemoryGraph::new();
        let id = graph.add("p", "r", Judgment::Neutral, scores, Emotion::Neutral, None);
        (graph, id)
    }

    #[test]
    fn positive_rating_lowers_regret() {
        let (mut graph, id) = one_node(RegretScores::fallback());
        let after = feedback_adjust(&mut graph, id, 9).expect("adjust");
        assert_eq!(after.ethical_regret(), 3.0);
        assert_eq!(after.factual_accuracy(), 7.0);
        assert_eq!(after.emotional_impact(), 7.0);
        assert_eq!(graph.node(id).expect("node").regret_scores, after);
    }

    #[test]
    fn neutral_rating_is_a_no_op() {
        let (mut graph, id) = one_node(RegretScores::new(4.0, 6.0, 7.0).expect("valid"));
        let after = feedback_adjust(&mut graph, id, 5).expect("adjust");
        assert_eq!(after, RegretScores::new(4.0, 6.0, 7.0).expect("valid"));
    }

    #[test]
    fn repeated_extremes_stay_clamped() {
        let (mut graph, id) = one_node(RegretScores::fallback());
        for _ in 0..10 {
            feedback_adjust(&mut graph, id, 10).expect("adjust");
        }
        let s = graph.node(id).expect("node").regret_scores;
        assert_eq!((s.ethical_regret(), s.factual_accuracy(), s.emotional_impact()), (1.0, 10.0, 10.0));

        for _ in 0..10 {
            feedback_adjust(&mut graph, id, 1).expect("adjust");
        }
        let s = graph.node(id).expect("node").regret_scores;
        assert_eq!((s.ethical_regret(), s.factual_accuracy(), s.emotional_impact()), (10.0, 1.0, 1.0));
    }

    #[test]
    fn invalid_rating_is_rejected_before_mutation() {
        let (mut graph, id) = one_node(RegretScores::fallback());
        assert!(matches!(feedback_adjust(&mut graph, id, 0), Err(RegretError::Validation(_))));
        assert!(matches!(feedback_adjust(&mut graph, id, 11), Err(RegretError::Validation(_))));
        assert_eq!(graph.node(id).expect("node").regret_scores, RegretScores::fallback());
    }

    #[test]
    fn unknown_node_is_not_found() {
        let mut graph = MemoryGraph::new();
        assert!(matches!(
            feedback_adjust(&mut graph, NodeId(42), 7),
            Err(RegretError::NodeNotFound(NodeId(42)))
        ));
    }
}
