//! The judge: response generation and regret scoring that never fails.
//!
//! ```text
//!   generate(prompt) ──► backend ──Ok──► text
//!                              └─Err─► "Error: <cause>"
//!
//!   judge(prompt, response) ──► backend ──► first {…} JSON object
//!                                      └──► "Judgment: …, Ethical: n, …" lines
//!                                      └──► fallback (neutral, 5/5/5)
//! ```
//!
//! Missing or out-of-range criteria become 5. Transport failures and text
//! with nothing recognisable produce the fallback verdict, so the memory
//! graph always advances even when the model is unreachable.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use regret_core::types::{SCORE_FALLBACK, SCORE_MAX, SCORE_MIN};
use regret_core::{Judgment, RegretScores};

use crate::client::Completion;
use crate::prompt;
use crate::types::{DEFAULT_MAX_TOKENS, JudgmentResponse, LlmRequest};

/// Token budget for judgments; the JSON answer needs more room than a reply.
pub const JUDGE_MAX_TOKENS: u32 = 200;

static JUDGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)judge?ment\W*(good|bad|neutral)").expect("judgment pattern is valid")
});
static ETHICAL_RE: LazyLock<Regex> = LazyLock::new(|| criterion_pattern("ethical"));
static FACTUAL_RE: LazyLock<Regex> = LazyLock::new(|| criterion_pattern("factual"));
static EMOTIONAL_RE: LazyLock<Regex> = LazyLock::new(|| criterion_pattern("emotional"));

fn criterion_pattern(name: &str) -> Regex {
    Regex::new(&format!(r"(?i){name}[a-z_ ]*\W*(\d+(?:\.\d+)?)")).expect("criterion pattern is valid")
}

/// A judged interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    /// Judge's label.
    pub judgment: Judgment,
    /// Criteria, each in `[1, 10]`.
    pub scores: RegretScores,
    /// Model explanation, or the raw output / failure cause.
    pub explanation: String,
    /// Whether this is the neutral 5/5/5 fallback.
    pub fallback: bool,
}

impl Verdict {
    /// The neutral 5/5/5 verdict used when judging fails.
    #[must_use]
    pub fn fallback(explanation: impl Into<String>) -> Self {
        Self {
            judgment: Judgment::Neutral,
            scores: RegretScores::fallback(),
            explanation: explanation.into(),
            fallback: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Extract a verdict from raw model output.
///
/// Tries the first balanced `{…}` object as JSON, then the
/// `Judgment: …, Ethical: n, Factual: n, Emotional: n` line format. Returns
/// `None` if neither yields a judgment or any criterion.
#[must_use]
pub fn parse_verdict(text: &str) -> Option<Verdict> {
    parse_json(text).or_else(|| parse_lines(text))
}

fn parse_json(text: &str) -> Option<Verdict> {
    let object = first_json_object(text)?;
    let parsed: JudgmentResponse = serde_json::from_str(object).ok()?;
    if parsed.is_empty() {
        return None;
    }
    let judgment = parsed
        .judgment
        .as_deref()
        .and_then(|j| j.parse().ok())
        .unwrap_or_default();
    let scores = RegretScores::clamped(
        criterion(parsed.ethical_regret.as_ref().and_then(value_to_f64)),
        criterion(parsed.factual_accuracy.as_ref().and_then(value_to_f64)),
        criterion(parsed.emotional_impact.as_ref().and_then(value_to_f64)),
    );
    Some(Verdict {
        judgment,
        scores,
        explanation: parsed.explanation.unwrap_or_else(|| text.trim().to_string()),
        fallback: false,
    })
}

fn parse_lines(text: &str) -> Option<Verdict> {
    let judgment = JUDGMENT_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<Judgment>().ok());
    let capture = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    };
    let (ethical, factual, emotional) = (capture(&ETHICAL_RE), capture(&FACTUAL_RE), capture(&EMOTIONAL_RE));

    if judgment.is_none() && ethical.is_none() && factual.is_none() && emotional.is_none() {
        return None;
    }
    Some(Verdict {
        judgment: judgment.unwrap_or_default(),
        scores: RegretScores::clamped(criterion(ethical), criterion(factual), criterion(emotional)),
        explanation: text.trim().to_string(),
        fallback: false,
    })
}

/// Range-checked criterion; anything unusable becomes the fallback score.
fn criterion(value: Option<f64>) -> f64 {
    value
        .filter(|v| v.is_finite() && (SCORE_MIN..=SCORE_MAX).contains(v))
        .unwrap_or(SCORE_FALLBACK)
}

fn value_to_f64(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// First balanced `{…}` span, skipping braces inside string literals.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Judge
// ---------------------------------------------------------------------------

/// Response generator and regret judge over one completion backend.
pub struct Judge<C> {
    backend: C,
    max_tokens: u32,
}

impl<C: Completion> Judge<C> {
    /// A judge with the default reply budget.
    #[must_use]
    pub fn new(backend: C) -> Self {
        Self {
            backend,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set the reply token budget (`[llm] max_tokens`).
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The completion backend.
    #[must_use]
    pub fn backend(&self) -> &C {
        &self.backend
    }

    /// Answer a prompt. Failures come back as `"Error: <cause>"`.
    pub async fn generate(&self, prompt: &str) -> String {
        let request = LlmRequest::new("", prompt).with_max_tokens(self.max_tokens);
        match self.backend.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Response generation failed");
                format!("Error: {e}")
            }
        }
    }

    /// Judge a prompt/response pair. Never fails; see [`Verdict::fallback`].
    pub async fn judge(&self, prompt: &str, response: &str) -> Verdict {
        let request = prompt::judge_request(prompt, response).with_max_tokens(JUDGE_MAX_TOKENS);
        let text = match self.backend.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "LLM judgment failed, using defaults");
                return Verdict::fallback(format!("Error: {e}"));
            }
        };

        match parse_verdict(&text) {
            Some(verdict) => {
                debug!(
                    judgment = %verdict.judgment,
                    ethical = verdict.scores.ethical_regret(),
                    factual = verdict.scores.factual_accuracy(),
                    emotional = verdict.scores.emotional_impact(),
                    template_version = prompt::JUDGE_TEMPLATE_VERSION,
                    "Parsed judgment"
                );
                verdict
            }
            None => {
                warn!(
                    output = %text,
                    template_version = prompt::JUDGE_TEMPLATE_VERSION,
                    "Unparseable judgment, using defaults"
                );
                Verdict::fallback(text)
            }
        }
    }
}
