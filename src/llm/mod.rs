//! LLM answer generation
//!
//! The pipeline talks to generative models through the [`AnswerGenerator`]
//! trait so tests can substitute stubs. The shipped implementation is
//! [`LlmClient`], an HTTP adapter that tolerates more than one call shape
//! and more than one response envelope.

pub mod client;
pub mod parse;
pub mod prompts;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;

pub use client::LlmClient;

/// Adapter contract for generative answer models
///
/// Returns either a structured JSON object (the model followed the prompt)
/// or a `{"raw": <text>}` carrier when no JSON could be extracted from the
/// output. Errors are reserved for invocation failures; parsing trouble is
/// never an error.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate_answer(&self, query: &str, context: &str, max_tokens: usize)
        -> Result<Value>;
}
