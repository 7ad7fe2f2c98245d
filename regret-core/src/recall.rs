//! Regret recall — "have we regretted something like this before?"
//!
//! A cheap keyword check: a prompt resembles a past memory when the two
//! share at least one word longer than three characters (compared
//! lowercase). Only memories whose overall regret exceeds the threshold are
//! consulted, and the scan stops at the first hit.

use std::collections::HashSet;

use crate::graph::MemoryGraph;

/// Words longer than three characters, lowercased.
#[must_use]
pub fn keywords(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .map(str::to_lowercase)
        .collect()
}

/// Whether `prompt` shares a keyword with any memory whose overall regret
/// exceeds `regret_threshold`.
#[must_use]
pub fn check_past_regrets(graph: &MemoryGraph, prompt: &str, regret_threshold: f64) -> bool {
    let query = keywords(prompt);
    if query.is_empty() {
        return false;
    }
    graph
        .nodes()
        .filter(|node| node.overall_regret() > regret_threshold)
        .any(|node| !keywords(&node.prompt).is_disjoint(&query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Emotion, Judgment, RegretScores};

    fn graph() -> MemoryGraph {
        let mut graph = MemoryGraph::new();
        graph.add(
            "Tell me a joke",
            "Why did the chicken cross the road?",
            Judgment::Good,
            RegretScores::new(2.0, 9.0, 8.0).expect("valid"),
            Emotion::Happy,
            None,
        );
        graph.add(
            "Write a cruel JOKE about my boss",
            "…",
            Judgment::Bad,
            RegretScores::new(9.0, 3.0, 2.0).expect("valid"),
            Emotion::Angry,
            None,
        );
        graph
    }

    #[test]
    fn keywords_drop_short_words() {
        let words = keywords("Tell me a JOKE now please");
        let mut sorted: Vec<_> = words.into_iter().collect();
        sorted.sort();
        assert_eq!(sorted, vec!["joke", "please", "tell"]);
    }

    #[test]
    fn matches_high_regret_vocabulary() {
        assert!(check_past_regrets(&graph(), "tell me a joke please", 7.0));
    }

    #[test]
    fn low_regret_memories_are_ignored() {
        // "tell" only appears in the low-regret memory.
        assert!(!check_past_regrets(&graph(), "tell me everything", 7.0));
    }

    #[test]
    fn disjoint_vocabulary_is_false() {
        assert!(!check_past_regrets(&graph(), "Unrelated prompt", 7.0));
        assert!(!check_past_regrets(&graph(), "a b c", 0.0));
        assert!(!check_past_regrets(&MemoryGraph::new(), "joke", 0.0));
    }
}
