//! Cross-encoder reranking of retrieval candidates
//!
//! Cross-encoders score the query and each candidate text jointly, which is
//! finer-grained than bi-encoder similarity. The shipped implementation
//! delegates scoring to a sidecar service exposing a `/rerank` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::AppConfig;
use crate::errors::ProdragError;
use crate::errors::Result;
use crate::rag::Candidate;

/// Pairwise relevance reranker
///
/// Reorders candidate ids by relevance to the query and truncates to the
/// `top_m` best. Output length never exceeds `top_m`.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        texts: &[String],
        ids: &[usize],
        top_m: usize,
    ) -> Result<Vec<Candidate>>;
}

/// Reranker backed by a cross-encoder sidecar over HTTP
pub struct CrossEncoderClient {
    endpoint: String,
    client: Client,
}

impl CrossEncoderClient {
    /// Create a new cross-encoder client
    pub fn new(endpoint: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| ProdragError::Http(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a cross-encoder client from application config
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.reranker.endpoint.clone())
    }

    /// Score candidate texts against the query
    async fn score(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        #[derive(Deserialize)]
        struct RerankResponse {
            scores: Vec<f32>,
        }

        let url = format!("{}/rerank", self.endpoint);
        debug!("Calling rerank API: {} ({} documents)", url, texts.len());

        let request = json!({
            "query": query,
            "documents": texts,
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
            return Err(ProdragError::Rerank(format!(
                "rerank API error ({status}): {error_text}"
            )));
        }

        let result: RerankResponse = response
            .json()
            .await
            .map_err(|e| ProdragError::Rerank(format!("Failed to parse response: {e}")))?;

        Ok(result.scores)
    }
}

#[async_trait]
impl Reranker for CrossEncoderClient {
    async fn rerank(
        &self,
        query: &str,
        texts: &[String],
        ids: &[usize],
        top_m: usize,
    ) -> Result<Vec<Candidate>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.len() != ids.len() {
            return Err(ProdragError::Rerank(format!(
                "got {} texts for {} candidate ids",
                texts.len(),
                ids.len()
            )));
        }

        let scores = self.score(query, texts).await?;
        if scores.len() != ids.len() {
            return Err(ProdragError::Rerank(format!(
                "rerank returned {} scores for {} candidates",
                scores.len(),
                ids.len()
            )));
        }

        Ok(rank_by_scores(ids, &scores, top_m))
    }
}

/// Order candidate ids by descending score and keep the `top_m` best
pub fn rank_by_scores(ids: &[usize], scores: &[f32], top_m: usize) -> Vec<Candidate> {
    let mut order: Vec<usize> = (0..ids.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.truncate(top_m);

    order
        .into_iter()
        .map(|i| Candidate {
            row: ids[i],
            score: scores[i],
        })
        .collect()
}
