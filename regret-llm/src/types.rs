//! Core types for LLM requests and responses.

use serde::{Deserialize, Serialize};

/// Default completion budget, matching `[llm] max_tokens`.
pub const DEFAULT_MAX_TOKENS: u32 = 100;
/// Default hard timeout, matching `[llm] request_timeout_ms`.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// A request to the LLM.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    /// System prompt (role, rules). May be empty.
    pub system: String,
    /// User prompt.
    pub user: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl LlmRequest {
    /// A request with default budget, temperature and timeout.
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.7,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// A low-temperature request for judgments, so repeated scoring of the
    /// same interaction stays stable.
    #[must_use]
    pub fn judgment(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            temperature: 0.1,
            ..Self::new(system, user)
        }
    }

    /// Set the token budget.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// System and user prompt joined for completion-style endpoints.
    #[must_use]
    pub fn flattened(&self) -> String {
        if self.system.is_empty() {
            self.user.clone()
        } else {
            format!("{}\n\n{}", self.system, self.user)
        }
    }
}

/// A response from the LLM.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated text.
    pub text: String,
    /// How many tokens were generated.
    pub tokens_generated: u32,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Which model was used.
    pub model: String,
}

/// Structured judgment the judge prompt asks for.
///
/// Every field is optional so that partial answers still parse; missing or
/// out-of-range criteria are filled in later.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JudgmentResponse {
    /// "good", "bad" or "neutral".
    #[serde(default)]
    pub judgment: Option<String>,
    /// 1 = no ethical concern, 10 = severe.
    #[serde(default)]
    pub ethical_regret: Option<serde_json::Value>,
    /// 1 = wrong, 10 = accurate.
    #[serde(default)]
    pub factual_accuracy: Option<serde_json::Value>,
    /// 1 = harmful, 10 = helpful.
    #[serde(default)]
    pub emotional_impact: Option<serde_json::Value>,
    /// Free-form reasoning.
    #[serde(default)]
    pub explanation: Option<String>,
}

impl JudgmentResponse {
    /// Whether any recognised field was present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.judgment.is_none()
            && self.ethical_regret.is_none()
            && self.factual_accuracy.is_none()
            && self.emotional_impact.is_none()
    }
}
