//! LLM Client — unified interface for Ollama and OpenAI-compatible backends.

use std::future::Future;
use std::time::{Duration, Instant};

use regret_core::config::LlmConfig;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::types::LlmRequest;
use crate::types::LlmResponse;

/// Something that turns a request into text.
///
/// [`LlmClient`] is the production implementation; tests substitute canned
/// backends.
pub trait Completion {
    /// Complete `request`, honouring its token budget and temperature.
    fn complete(&self, request: &LlmRequest) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// Provider backend for LLM inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    /// Ollama running locally (recommended).
    Ollama {
        /// Server root, e.g. `http://localhost:11434`.
        base_url: String,
    },
    /// OpenAI-compatible chat completions API.
    OpenAiCompatible {
        /// API root, without `/v1`.
        base_url: String,
        /// Bearer token.
        api_key: String,
    },
    /// No LLM available; every call fails and the judge falls back.
    None,
}

impl LlmProvider {
    /// Select the backend named by `[llm] provider`.
    ///
    /// # Errors
    /// [`LlmError::ConfigError`] for an unknown provider name.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        match config.provider.to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama { base_url }),
            "openai" | "openai_compatible" => Ok(Self::OpenAiCompatible {
                base_url,
                api_key: config.api_key.clone(),
            }),
            "none" | "" => Ok(Self::None),
            other => Err(LlmError::ConfigError(format!("unknown LLM provider '{other}'"))),
        }
    }
}

/// The main LLM client that routes requests to the configured backend.
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
    max_retries: u32,
    request_timeout_ms: u64,
}

impl LlmClient {
    /// Create a new LLM client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>, max_retries: u32) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
            max_retries,
            request_timeout_ms: crate::types::DEFAULT_TIMEOUT_MS,
        }
    }

    /// Create a client from the `[llm]` config section.
    ///
    /// # Errors
    /// [`LlmError::ConfigError`] for an unknown provider.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let provider = LlmProvider::from_config(config)?;
        Ok(Self {
            request_timeout_ms: config.request_timeout_ms,
            ..Self::new(provider, config.model.clone(), config.max_retries)
        })
    }

    /// Create a client with no LLM backend (all calls fail → fallback).
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, String::new(), 0)
    }

    /// The configured backend.
    #[must_use]
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Model name sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check if the LLM client has a backend configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    /// Generate a response from the LLM.
    ///
    /// # Errors
    /// [`LlmError::Unavailable`] without a backend, [`LlmError::ParseError`]
    /// for an unreadable body, [`LlmError::RetriesExhausted`] once every
    /// attempt failed.
    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("No LLM provider configured".into())),
            LlmProvider::Ollama { base_url } => {
                let url = format!("{base_url}/api/generate");
                let body = json!({
                    "model": self.model,
                    "prompt": request.flattened(),
                    "stream": false,
                    "options": {
                        "temperature": request.temperature,
                        "num_predict": request.max_tokens,
                    }
                });
                self.post_with_retries("Ollama", &url, &body, None, request.timeout_ms, |json| {
                    let text = json["response"]
                        .as_str()
                        .or_else(|| json["text"].as_str())
                        .unwrap_or_default();
                    (text.to_string(), json["eval_count"].as_u64())
                })
                .await
            }
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                let url = format!("{base_url}/v1/chat/completions");
                let mut messages = Vec::with_capacity(2);
                if !request.system.is_empty() {
                    messages.push(json!({ "role": "system", "content": request.system }));
                }
                messages.push(json!({ "role": "user", "content": request.user }));
                let body = json!({
                    "model": self.model,
                    "messages": messages,
                    "max_tokens": request.max_tokens,
                    "temperature": request.temperature,
                });
                self.post_with_retries(
                    "OpenAI",
                    &url,
                    &body,
                    Some(api_key),
                    request.timeout_ms,
                    |json| {
                        let text = json["choices"][0]["message"]["content"]
                            .as_str()
                            .unwrap_or_default();
                        (text.to_string(), json["usage"]["completion_tokens"].as_u64())
                    },
                )
                .await
            }
        }
    }

    async fn post_with_retries(
        &self,
        backend: &str,
        url: &str,
        body: &Value,
        api_key: Option<&str>,
        timeout_ms: u64,
        extract: impl Fn(&Value) -> (String, Option<u64>),
    ) -> Result<LlmResponse, LlmError> {
        let mut last_error = LlmError::Unavailable(format!("{backend} was never contacted"));
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(backend, attempt = attempt + 1, of = self.max_retries + 1, "Retrying LLM call");
            }

            let start = Instant::now();
            let mut post = self
                .http
                .post(url)
                .json(body)
                .timeout(Duration::from_millis(timeout_ms));
            if let Some(key) = api_key {
                post = post.bearer_auth(key);
            }
            let result = post.send().await;

            #[allow(clippy::cast_possible_truncation)]
            let latency_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) if resp.status().is_success() => {
                    let json: Value = resp
                        .json()
                        .await
                        .map_err(|e| LlmError::ParseError(e.to_string()))?;
                    let (text, tokens) = extract(&json);
                    debug!(backend, latency_ms, chars = text.len(), "LLM call succeeded");
                    return Ok(LlmResponse {
                        text,
                        tokens_generated: tokens.map_or(0, |t| u32::try_from(t).unwrap_or(u32::MAX)),
                        latency_ms,
                        model: self.model.clone(),
                    });
                }
                Ok(resp) => {
                    let status = resp.status();
                    warn!(backend, %status, "LLM backend returned error");
                    last_error = LlmError::RequestFailed(format!(
                        "HTTP {status}: {}",
                        resp.text().await.unwrap_or_default()
                    ));
                }
                Err(e) => {
                    last_error = LlmError::from_transport(&e, timeout_ms);
                    warn!(backend, error = %last_error, "LLM request failed");
                }
            }
        }

        if self.max_retries == 0 {
            return Err(last_error);
        }
        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error: last_error.to_string(),
        })
    }
}

impl Completion for LlmClient {
    /// The configured `request_timeout_ms` caps the request's own timeout.
    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let request = LlmRequest {
            timeout_ms: request.timeout_ms.min(self.request_timeout_ms),
            ..request.clone()
        };
        Ok(self.generate(&request).await?.text)
    }
}
