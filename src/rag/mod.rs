//! RAG (Retrieval-Augmented Generation) module
//!
//! End-to-end product search over a catalog:
//! - Semantic retrieval using vector embeddings
//! - Cross-encoder reranking of the candidate set
//! - Context assembly from the top candidates
//! - LLM-based structured answer generation with deterministic fallback
//!
//! # Examples
//!
//! ```rust,no_run
//! use prodrag::config::AppConfig;
//! use prodrag::rag::RagService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = RagService::from_config(&config)?;
//!
//!     let answer = service.answer("lightweight trail running shoes").await?;
//!     println!("{}", serde_json::to_string_pretty(&answer)?);
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod pipeline;
pub mod reranker;
pub mod retriever;

pub use context::ContextAssembler;
pub use pipeline::normalize_generator_output;
pub use pipeline::RagService;
pub use reranker::CrossEncoderClient;
pub use reranker::Reranker;
pub use retriever::Retriever;

use async_trait::async_trait;
use serde::Serialize;

use crate::catalog::Product;
use crate::errors::Result;

/// A retrieval candidate: catalog row id plus similarity/relevance score
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub row: usize,
    pub score: f32,
}

/// A resolved search hit with catalog metadata
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub product_id: String,
    pub product_name: String,
    pub product_description: String,
    pub score: f32,
}

/// Candidate source consumed by the pipeline
///
/// Wraps the vector index plus the catalog it is aligned with, so the
/// orchestrator can both retrieve candidates and resolve them to products.
/// Kept object-safe so tests can substitute stubs.
#[async_trait]
pub trait CandidateRetriever: Send + Sync {
    /// Nearest candidates for a query, ordered by descending similarity
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Candidate>>;

    /// Product at a catalog row position
    fn get_product(&self, row: usize) -> Result<Product>;

    /// Product by stable external identifier (string-compared)
    fn find_by_product_id(&self, product_id: &str) -> Option<Product>;
}
