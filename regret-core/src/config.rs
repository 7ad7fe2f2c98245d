//! Configuration for the RegretGraph system.
//!
//! Maps directly to `regret.toml`. Every field has a default, so an empty
//! file (or no file at all) yields a working configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegretConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Memory-graph policy thresholds.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// LLM integration settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Snapshot settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl RegretConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `RegretError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::RegretError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Thresholds that drive forgetting, regret recall and mood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Overall regret separating "remarkable" from "forgettable" memories.
    #[serde(default = "default_regret_threshold")]
    pub regret_threshold: f64,
    /// Memories older than this many days are considered stale.
    #[serde(default = "default_age_days")]
    pub age_days_threshold: i64,
    /// Residual regret lost per elapsed day.
    #[serde(default = "default_forgetting_decay")]
    pub forgetting_decay: f64,
    /// Average regret above which mood flips to the low branch.
    #[serde(default = "default_mood_threshold")]
    pub mood_threshold: f64,
    /// Overall regret above which an exported node is flagged as high-regret.
    #[serde(default = "default_regret_threshold")]
    pub high_regret_marker: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            regret_threshold: 7.0,
            age_days_threshold: 7,
            forgetting_decay: 1.0,
            mood_threshold: 5.0,
            high_regret_marker: 7.0,
        }
    }
}

/// LLM integration configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: "ollama", "openai", "none".
    #[serde(default = "default_ollama")]
    pub provider: String,
    /// Base URL for the LLM API.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    /// Model name used for both generation and judgment.
    #[serde(default = "default_model")]
    pub model: String,
    /// Bearer token for OpenAI-compatible APIs.
    #[serde(default)]
    pub api_key: String,
    /// Hard timeout for any LLM call in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Retries after the first failed attempt.
    #[serde(default = "default_1")]
    pub max_retries: u32,
    /// Token budget for each completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "llama2".to_string(),
            api_key: String::new(),
            request_timeout_ms: 30_000,
            max_retries: 1,
            max_tokens: 100,
        }
    }
}

/// Snapshot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Where the graph snapshot lives.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    /// Store and verify a CRC-32 of the payload.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
    /// Write a snapshot when the console exits.
    #[serde(default = "default_true")]
    pub save_on_exit: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "graphs/graph.bin".to_string(),
            checksum_enabled: true,
            save_on_exit: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_ollama() -> String { "ollama".to_string() }
fn default_ollama_url() -> String { "http://localhost:11434".to_string() }
fn default_model() -> String { "llama2".to_string() }
fn default_snapshot_path() -> String { "graphs/graph.bin".to_string() }
fn default_regret_threshold() -> f64 { 7.0 }
fn default_forgetting_decay() -> f64 { 1.0 }
fn default_mood_threshold() -> f64 { 5.0 }
fn default_age_days() -> i64 { 7 }
fn default_1() -> u32 { 1 }
fn default_max_tokens() -> u32 { 100 }
fn default_timeout_ms() -> u64 { 30_000 }
