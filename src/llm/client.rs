//! HTTP client for generative answer models

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::config::AppConfig;
use crate::errors::ProdragError;
use crate::errors::Result;
use crate::llm::parse::extract_json_object;
use crate::llm::parse::unwrap_response_text;
use crate::llm::prompts::answer_prompt;
use crate::llm::AnswerGenerator;

/// Generative model client
///
/// Serving stacks disagree on the call shape, so the client carries a closed
/// set of strategies tried in sequence: the native generate endpoint first,
/// then an OpenAI-style chat completion. Whichever succeeds wins.
pub struct LlmClient {
    endpoint: String,
    api_key: String,
    model: String,
    client: Client,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(endpoint: String, api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| ProdragError::Http(e.to_string()))?;

        Ok(Self {
            endpoint,
            api_key,
            model,
            client,
        })
    }

    /// Create an LLM client from application config
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.llm.llm_endpoint.clone(),
            config.llm.llm_key.clone(),
            config.llm.llm_model.clone(),
        )
    }

    /// Call the native generate endpoint (Ollama shape)
    async fn generate_native(&self, prompt: &str, max_tokens: usize) -> Result<Value> {
        let url = format!("{}/api/generate", self.endpoint);
        debug!("Calling generate API: {}", url);

        let request = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "num_predict": max_tokens },
        });

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProdragError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProdragError::Generation(format!(
                "generate API error ({status}): {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProdragError::Generation(format!("Failed to parse response: {e}")))
    }

    /// Call an OpenAI-style chat completions endpoint
    async fn generate_chat(&self, prompt: &str, max_tokens: usize) -> Result<Value> {
        let url = format!("{}/v1/chat/completions", self.endpoint);
        debug!("Calling chat completions API: {}", url);

        let request = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProdragError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProdragError::Generation(format!(
                "chat completions API error ({status}): {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProdragError::Generation(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl AnswerGenerator for LlmClient {
    /// Generate a structured answer from query + context
    ///
    /// Returns the parsed JSON object the model produced, or a
    /// `{"raw": <text>}` carrier when the output held no parseable JSON.
    ///
    /// # Errors
    /// Fails only when every call strategy fails against the model endpoint.
    async fn generate_answer(
        &self,
        query: &str,
        context: &str,
        max_tokens: usize,
    ) -> Result<Value> {
        let prompt = answer_prompt(query, context);

        let raw = match self.generate_native(&prompt, max_tokens).await {
            Ok(raw) => raw,
            Err(native_err) => {
                debug!(
                    "Native generate call failed ({}), trying chat completions",
                    native_err
                );
                self.generate_chat(&prompt, max_tokens).await.map_err(|chat_err| {
                    ProdragError::Generation(format!(
                        "all call strategies failed: {native_err}; {chat_err}"
                    ))
                })?
            }
        };

        let text = unwrap_response_text(&raw);
        debug!("Raw LLM output: {}", text.chars().take(8000).collect::<String>());

        match extract_json_object(&text) {
            Some(parsed) => Ok(parsed),
            None => {
                warn!("Model returned no JSON; passing raw text through");
                Ok(json!({ "raw": text }))
            }
        }
    }
}
