//! Retrieval over the vector index and product catalog

use async_trait::async_trait;
use tracing::debug;

use crate::catalog::Catalog;
use crate::catalog::Product;
use crate::config::AppConfig;
use crate::embeddings::EmbeddingClient;
use crate::errors::ProdragError;
use crate::errors::Result;
use crate::index::normalize_l2;
use crate::index::FlatIndex;
use crate::rag::Candidate;
use crate::rag::CandidateRetriever;

/// Retriever for semantic product search
///
/// Embeds the query, normalizes it, and scans the index. Row ids returned
/// by the index address rows of the catalog.
pub struct Retriever {
    index: FlatIndex,
    catalog: Catalog,
    embeddings: EmbeddingClient,
}

impl Retriever {
    /// Create a new retriever from loaded components
    pub fn new(index: FlatIndex, catalog: Catalog, embeddings: EmbeddingClient) -> Self {
        Self {
            index,
            catalog,
            embeddings,
        }
    }

    /// Load index and catalog from the configured paths
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let catalog = Catalog::load(config.catalog_path())?;
        let index = FlatIndex::load(config.index_path())?;
        if index.len() != catalog.len() {
            return Err(ProdragError::Index(format!(
                "index has {} vectors but catalog has {} rows",
                index.len(),
                catalog.len()
            )));
        }
        let embeddings = EmbeddingClient::from_config(config)?;
        Ok(Self::new(index, catalog, embeddings))
    }

    /// Number of indexed products
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}

#[async_trait]
impl CandidateRetriever for Retriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Candidate>> {
        debug!("Performing semantic search: {}", query);

        let mut embedding = self.embeddings.generate(query).await?;
        normalize_l2(&mut embedding);

        let (ids, scores) = self.index.search(&embedding, top_k)?;
        Ok(ids
            .into_iter()
            .zip(scores)
            .map(|(row, score)| Candidate { row, score })
            .collect())
    }

    fn get_product(&self, row: usize) -> Result<Product> {
        self.catalog
            .get(row)
            .cloned()
            .ok_or_else(|| ProdragError::Index(format!("catalog row {row} out of range")))
    }

    fn find_by_product_id(&self, product_id: &str) -> Option<Product> {
        self.catalog.find_by_product_id(product_id).cloned()
    }
}
