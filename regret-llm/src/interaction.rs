//! One full interaction: answer, judge, remember.

use serde::Serialize;
use tracing::info;

use regret_core::{MemoryEngine, Recorded, derive_emotion};

use crate::client::Completion;
use crate::judge::{Judge, Verdict};

/// Everything produced for one prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interaction {
    /// Generated response, or an `Error: …` marker.
    pub response: String,
    /// Judge verdict (possibly the fallback).
    pub verdict: Verdict,
    /// The node recorded for this interaction.
    pub recorded: Recorded,
    /// Whether the prompt resembled a previously regretted one, checked
    /// before this interaction was recorded.
    pub past_regret_match: bool,
}

/// Generate a response, judge it, derive the emotion and record the node.
///
/// The graph advances even when the backend is down: generation degrades to
/// an error marker and judgment to the neutral fallback.
pub async fn process_prompt<C: Completion>(
    engine: &MemoryEngine,
    judge: &Judge<C>,
    prompt: &str,
) -> Interaction {
    let past_regret_match = engine.check_past_regrets(prompt, engine.config().regret_threshold);

    let response = judge.generate(prompt).await;
    let verdict = judge.judge(prompt, &response).await;

    let scores = verdict.scores;
    let emotion = derive_emotion(
        verdict.judgment,
        scores.overall_regret(),
        scores.factual_accuracy(),
        scores.emotional_impact(),
        None,
    );
    let recorded = engine.record(prompt, response.as_str(), verdict.judgment, scores, emotion);

    info!(
        node = %recorded.node_id,
        judgment = %verdict.judgment,
        regret = format_args!("{:.2}", recorded.overall_regret),
        %emotion,
        mood = recorded.mood,
        fallback = verdict.fallback,
        past_regret_match,
        "Processed prompt"
    );

    Interaction {
        response,
        verdict,
        recorded,
        past_regret_match,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::types::LlmRequest;
    use regret_core::{Emotion, Judgment, NodeId};

    /// Answers every generation with a fixed reply and every judgment with a
    /// fixed verdict text.
    struct Scripted {
        reply: &'static str,
        verdict: &'static str,
    }

    impl Completion for Scripted {
        async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
            if request.system.contains("impartial reviewer") {
                Ok(self.verdict.to_string())
            } else {
                Ok(self.reply.to_string())
            }
        }
    }

    struct Offline;

    impl Completion for Offline {
        async fn complete(&self, _request: &LlmRequest) -> Result<String, LlmError> {
            Err(LlmError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn records_judged_interaction() {
        let engine = MemoryEngine::default();
        let judge = Judge::new(Scripted {
            reply: "You're stupid",
            verdict: r#"{"judgment": "bad", "ethical_regret": 9, "factual_accuracy": 4, "emotional_impact": 2}"#,
        });

        let out = process_prompt(&engine, &judge, "Insult me").await;
        assert_eq!(out.response, "You're stupid");
        assert_eq!(out.verdict.judgment, Judgment::Bad);
        assert_eq!(out.recorded.node_id, NodeId(1));
        assert_eq!(out.recorded.emotion, Emotion::Angry);
        assert!(!out.past_regret_match, "graph was empty");

        let node = engine.node(NodeId(1)).expect("recorded");
        assert_eq!(node.prompt, "Insult me");
        assert_eq!(node.response, "You're stupid");
    }

    #[tokio::test]
    async fn past_regret_is_checked_before_recording() {
        let engine = MemoryEngine::default();
        let judge = Judge::new(Scripted {
            reply: "No.",
            verdict: "Judgment: bad, Ethical: 10, Factual: 1, Emotional: 1",
        });

        let first = process_prompt(&engine, &judge, "insult my neighbour").await;
        assert!(!first.past_regret_match);
        let second = process_prompt(&engine, &judge, "please insult him").await;
        assert!(second.past_regret_match);
        assert_eq!(engine.len(), 2);
    }

    #[tokio::test]
    async fn offline_backend_still_advances_graph() {
        let engine = MemoryEngine::default();
        let judge = Judge::new(Offline);

        let out = process_prompt(&engine, &judge, "Hello world").await;
        assert!(out.response.starts_with("Error: "));
        assert!(out.verdict.fallback);
        assert_eq!(out.verdict.judgment, Judgment::Neutral);
        assert_eq!(out.recorded.overall_regret, 5.0);
        assert_eq!(out.recorded.emotion, Emotion::Neutral);
        assert_eq!(out.recorded.mood, 10);
        assert_eq!(engine.len(), 1);
    }
}
