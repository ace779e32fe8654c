//! End-to-end pipeline tests through the public API, using stub collaborators

use std::sync::Arc;

use async_trait::async_trait;
use prodrag::catalog::Product;
use prodrag::errors::ProdragError;
use prodrag::errors::Result;
use prodrag::llm::AnswerGenerator;
use prodrag::rag::Candidate;
use prodrag::rag::CandidateRetriever;
use prodrag::rag::RagService;
use prodrag::rag::Reranker;
use serde_json::json;
use serde_json::Value;

struct FixtureRetriever {
    products: Vec<Product>,
}

impl FixtureRetriever {
    fn shoes() -> Arc<Self> {
        let products = vec![
            Product {
                product_id: "201".to_string(),
                product_name: "Trail Runner".to_string(),
                product_description: "Grippy lightweight trail running shoe".to_string(),
            },
            Product {
                product_id: "202".to_string(),
                product_name: "Road Glide".to_string(),
                product_description: "Cushioned road running shoe for long distances".to_string(),
            },
            Product {
                product_id: "203".to_string(),
                product_name: "City Walker".to_string(),
                product_description: "Casual everyday walking shoe".to_string(),
            },
        ];
        Arc::new(Self { products })
    }

    fn with_long_descriptions(count: usize, description_len: usize) -> Arc<Self> {
        let products = (0..count)
            .map(|i| Product {
                product_id: format!("{}", 300 + i),
                product_name: format!("Product {i}"),
                product_description: "d".repeat(description_len),
            })
            .collect();
        Arc::new(Self { products })
    }
}

#[async_trait]
impl CandidateRetriever for FixtureRetriever {
    async fn retrieve(&self, _query: &str, top_k: usize) -> Result<Vec<Candidate>> {
        Ok((0..self.products.len().min(top_k))
            .map(|row| Candidate {
                row,
                score: 1.0 - row as f32 * 0.05,
            })
            .collect())
    }

    fn get_product(&self, row: usize) -> Result<Product> {
        self.products
            .get(row)
            .cloned()
            .ok_or_else(|| ProdragError::Index(format!("catalog row {row} out of range")))
    }

    fn find_by_product_id(&self, product_id: &str) -> Option<Product> {
        self.products
            .iter()
            .find(|p| p.product_id == product_id)
            .cloned()
    }
}

/// Generator that records the context it was handed
struct ContextCapturingGenerator {
    captured: std::sync::Mutex<Vec<String>>,
    response: Value,
}

#[async_trait]
impl AnswerGenerator for ContextCapturingGenerator {
    async fn generate_answer(
        &self,
        _query: &str,
        context: &str,
        _max_tokens: usize,
    ) -> Result<Value> {
        self.captured.lock().unwrap().push(context.to_string());
        Ok(self.response.clone())
    }
}

struct SwappingReranker;

#[async_trait]
impl Reranker for SwappingReranker {
    async fn rerank(
        &self,
        _query: &str,
        _texts: &[String],
        ids: &[usize],
        top_m: usize,
    ) -> Result<Vec<Candidate>> {
        // Promote the last candidate to the front.
        let mut reordered: Vec<usize> = ids.to_vec();
        reordered.rotate_right(1);
        Ok(reordered
            .into_iter()
            .take(top_m)
            .enumerate()
            .map(|(rank, row)| Candidate {
                row,
                score: 0.99 - rank as f32 * 0.01,
            })
            .collect())
    }
}

#[tokio::test]
async fn full_pipeline_returns_enriched_structured_answer() {
    let generator = Arc::new(ContextCapturingGenerator {
        captured: std::sync::Mutex::new(Vec::new()),
        response: json!({
            "best_product_id": "201",
            "reasons": ["best grip for trails"],
            "top_candidates": [{"product_id": 201, "score": 0.95}],
        }),
    });
    let service = RagService::from_services(FixtureRetriever::shoes(), None, Some(generator.clone()));

    let answer = service
        .answer_with_options("shoes for muddy trails", 50, 2)
        .await
        .unwrap();

    assert_eq!(answer["best_product_id"], "201");
    assert_eq!(answer["best_product"]["product_name"], "Trail Runner");

    // The generator saw a context assembled from the top candidates.
    let contexts = generator.captured.lock().unwrap();
    assert_eq!(contexts.len(), 1);
    assert!(contexts[0].contains("Trail Runner"));
    assert!(contexts[0].contains("product_id: 201"));
}

#[tokio::test]
async fn context_respects_character_budget() {
    let generator = Arc::new(ContextCapturingGenerator {
        captured: std::sync::Mutex::new(Vec::new()),
        response: json!({"raw": "ignored"}),
    });
    let retriever = FixtureRetriever::with_long_descriptions(5, 400);
    let service = RagService::from_services(retriever, None, Some(generator.clone()))
        .with_context_budget(100);

    service.answer_with_options("anything", 5, 5).await.unwrap();

    let contexts = generator.captured.lock().unwrap();
    assert_eq!(contexts.len(), 1);
    assert!(contexts[0].len() <= 100);
}

#[tokio::test]
async fn reranked_order_drives_fallback_and_search() {
    let retriever = FixtureRetriever::shoes();
    let service =
        RagService::from_services(retriever, Some(Arc::new(SwappingReranker)), None);

    // rotate_right promotes the last retrieval candidate (City Walker).
    let answer = service.answer_with_options("walking shoes", 3, 3).await.unwrap();
    assert_eq!(answer["best_product_id"], "203");

    let hits = service.search("walking shoes", 3, 2, true).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].product_id, "203");
    assert_eq!(hits[1].product_id, "201");
}

#[tokio::test]
async fn search_without_rerank_keeps_similarity_order() {
    let retriever = FixtureRetriever::shoes();
    let service =
        RagService::from_services(retriever, Some(Arc::new(SwappingReranker)), None);

    let hits = service.search("shoes", 3, 3, false).await.unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.product_id.as_str()).collect();
    assert_eq!(ids, vec!["201", "202", "203"]);
}

#[tokio::test]
async fn invalid_query_is_rejected_with_bad_input_error() {
    let service = RagService::from_services(FixtureRetriever::shoes(), None, None);
    let err = service.answer(" \t ").await.unwrap_err();
    assert!(matches!(err, ProdragError::InvalidQuery(_)));
}
