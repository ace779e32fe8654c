//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::rag::SearchHit;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Product search request
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_rerank_m")]
    pub rerank_m: usize,
    #[serde(default = "default_use_rerank")]
    pub use_rerank: bool,
}

fn default_top_k() -> usize {
    50
}

fn default_rerank_m() -> usize {
    10
}

fn default_use_rerank() -> bool {
    true
}

/// Product search response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
}

/// RAG answer request
#[derive(Debug, Deserialize)]
pub struct RagRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_rag_rerank_m")]
    pub rerank_m: usize,
}

fn default_rag_rerank_m() -> usize {
    5
}
