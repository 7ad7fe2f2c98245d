//! # regret-llm — LLM Layer for RegretGraph
//!
//! Produces the two external signals the memory graph consumes:
//!   - **Response generation**: the assistant's answer to a prompt.
//!   - **Regret judgment**: a good/bad/neutral label plus ethical,
//!     factual and emotional criteria for a prompt/response pair.
//!
//! Backends:
//!   - **Ollama** (local, default)
//!   - **OpenAI-compatible API**
//!   - **None** (every call fails over to the fallback path)
//!
//! # Architecture
//!
//! ```text
//! prompt ──► Judge::generate ──► Judge::judge ──► derive_emotion ──► MemoryEngine::record
//!               │                    │
//!               └── Completion ◄─────┘   (LlmClient, or a stub in tests)
//! ```
//!
//! Nothing here returns an error to the caller of [`process_prompt`]: a dead
//! backend yields an `Error: …` response and a neutral 5/5/5 verdict.

pub mod client;
pub mod error;
pub mod interaction;
pub mod judge;
pub mod prompt;
pub mod types;

pub use client::{Completion, LlmClient, LlmProvider};
pub use error::LlmError;
pub use interaction::{Interaction, process_prompt};
pub use judge::{Judge, Verdict, parse_verdict};
pub use types::{JudgmentResponse, LlmRequest, LlmResponse};
