//! Complete RAG pipeline: Retrieve -> Rerank -> Generate
//!
//! Every collaborator past retrieval is optional and best-effort: a failed
//! rerank keeps the original order, a failed generation falls back to a
//! deterministic answer. The only hard failures are an invalid query and a
//! broken retrieval step.

use std::sync::Arc;

use serde_json::json;
use serde_json::Value;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::errors::ProdragError;
use crate::errors::Result;
use crate::llm::parse::extract_json_object;
use crate::llm::AnswerGenerator;
use crate::llm::LlmClient;
use crate::rag::Candidate;
use crate::rag::CandidateRetriever;
use crate::rag::ContextAssembler;
use crate::rag::CrossEncoderClient;
use crate::rag::Reranker;
use crate::rag::Retriever;
use crate::rag::SearchHit;

/// Complete RAG service
pub struct RagService {
    retriever: Arc<dyn CandidateRetriever>,
    reranker: Option<Arc<dyn Reranker>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    context_assembler: ContextAssembler,
    max_answer_tokens: usize,
    default_top_k: usize,
    default_rerank_top: usize,
}

impl RagService {
    /// Create a RAG service from application config
    ///
    /// Loads the catalog and vector index, and wires up the reranker and
    /// generator clients when they are enabled.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let retriever = Arc::new(Retriever::from_config(config)?);

        let reranker: Option<Arc<dyn Reranker>> = if config.reranker_enabled() {
            Some(Arc::new(CrossEncoderClient::from_config(config)?))
        } else {
            None
        };

        let generator: Option<Arc<dyn AnswerGenerator>> = if config.llm_enabled() {
            Some(Arc::new(LlmClient::from_config(config)?))
        } else {
            None
        };

        Ok(Self {
            retriever,
            reranker,
            generator,
            context_assembler: ContextAssembler::new(config.max_context_chars()),
            max_answer_tokens: config.llm.max_tokens,
            default_top_k: config.top_k(),
            default_rerank_top: config.rerank_top(),
        })
    }

    /// Create from existing collaborators
    pub fn from_services(
        retriever: Arc<dyn CandidateRetriever>,
        reranker: Option<Arc<dyn Reranker>>,
        generator: Option<Arc<dyn AnswerGenerator>>,
    ) -> Self {
        Self {
            retriever,
            reranker,
            generator,
            context_assembler: ContextAssembler::default(),
            max_answer_tokens: 1024,
            default_top_k: 50,
            default_rerank_top: 5,
        }
    }

    /// Override the context character budget
    pub fn with_context_budget(mut self, max_context_chars: usize) -> Self {
        self.context_assembler = ContextAssembler::new(max_context_chars);
        self
    }

    /// Answer a query with the configured defaults
    pub async fn answer(&self, query: &str) -> Result<Value> {
        self.answer_with_options(query, self.default_top_k, self.default_rerank_top)
            .await
    }

    /// Run the full pipeline
    ///
    /// 1. Retrieve up to `top_k` candidates
    /// 2. Rerank to the `rerank_top` most relevant, when a reranker is configured
    /// 3. Assemble bounded context and call the generator, when configured
    /// 4. Normalize the generator output and enrich the best match
    /// 5. Deterministic fallback when generation is unavailable or fails
    ///
    /// # Errors
    /// - `InvalidQuery` for an empty or whitespace-only query
    /// - Retrieval errors (embedding generation, index search, catalog access)
    pub async fn answer_with_options(
        &self,
        query: &str,
        top_k: usize,
        rerank_top: usize,
    ) -> Result<Value> {
        if query.trim().is_empty() {
            return Err(ProdragError::InvalidQuery(
                "query must be a non-empty string".to_string(),
            ));
        }

        info!("Processing RAG query: {}", query);

        // Step 1: retrieve candidates
        let mut candidates = self.retriever.retrieve(query, top_k).await?;
        if candidates.is_empty() {
            return Ok(json!({
                "best_product_id": null,
                "reasons": ["no candidates"],
                "top_candidates": [],
            }));
        }
        debug!("Retrieved {} candidates", candidates.len());

        // Step 2: rerank, never fatal
        if let Some(reranker) = &self.reranker {
            candidates = self
                .rerank_candidates(reranker.as_ref(), query, candidates, rerank_top)
                .await?;
        }

        // Step 3: assemble context from the top candidates
        let top = &candidates[..candidates.len().min(rerank_top)];
        let products = self.resolve_products(top)?;
        let context = self.context_assembler.assemble(&products);

        // Step 4: generate an answer, falling back on any failure
        if let Some(generator) = &self.generator {
            match generator
                .generate_answer(query, &context, self.max_answer_tokens)
                .await
            {
                Ok(raw) => {
                    let mut answer = normalize_generator_output(&raw);
                    self.enrich_best_product(&mut answer);
                    info!("RAG query completed with generated answer");
                    return Ok(answer);
                }
                Err(e) => {
                    warn!("Answer generation failed; falling back: {}", e);
                }
            }
        }

        // Step 5: deterministic fallback from the top-ranked candidate
        let answer = self.fallback_answer(top)?;
        info!("RAG query completed with fallback answer");
        Ok(answer)
    }

    /// Plain search without answer generation
    ///
    /// Retrieves `top_k` candidates, optionally reranks, and resolves the
    /// top `rerank_m` rows to full product metadata.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        rerank_m: usize,
        use_rerank: bool,
    ) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(ProdragError::InvalidQuery(
                "query must be a non-empty string".to_string(),
            ));
        }

        info!("Processing search query: {}", query);

        let mut candidates = self.retriever.retrieve(query, top_k).await?;

        if use_rerank {
            if let Some(reranker) = &self.reranker {
                candidates = self
                    .rerank_candidates(reranker.as_ref(), query, candidates, rerank_m)
                    .await?;
            }
        }

        candidates.truncate(rerank_m);

        let mut hits = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let product = self.retriever.get_product(candidate.row)?;
            hits.push(SearchHit {
                product_id: product.product_id,
                product_name: product.product_name,
                product_description: product.product_description,
                score: candidate.score,
            });
        }
        Ok(hits)
    }

    /// Rerank candidates, keeping the original order on any reranker failure
    async fn rerank_candidates(
        &self,
        reranker: &dyn Reranker,
        query: &str,
        candidates: Vec<Candidate>,
        top_m: usize,
    ) -> Result<Vec<Candidate>> {
        let mut texts = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let product = self.retriever.get_product(candidate.row)?;
            texts.push(format!(
                "{} - {}",
                product.product_name, product.product_description
            ));
        }
        let ids: Vec<usize> = candidates.iter().map(|c| c.row).collect();

        match reranker.rerank(query, &texts, &ids, top_m).await {
            Ok(reranked) => Ok(reranked),
            Err(e) => {
                warn!("Reranker failed, continuing with original order: {}", e);
                Ok(candidates)
            }
        }
    }

    /// Resolve candidates to catalog products
    fn resolve_products(&self, candidates: &[Candidate]) -> Result<Vec<crate::catalog::Product>> {
        candidates
            .iter()
            .map(|c| self.retriever.get_product(c.row))
            .collect()
    }

    /// Attach full catalog metadata for the generator's best match
    ///
    /// Lookup is by the catalog's stable identifier, string-compared.
    /// A missing or unresolvable id is skipped without altering the answer.
    fn enrich_best_product(&self, answer: &mut Value) {
        let Some(best) = answer.get("best_product_id") else {
            return;
        };
        if best.is_null() {
            return;
        }

        let key = match best {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        if let Some(product) = self.retriever.find_by_product_id(&key) {
            if let Some(obj) = answer.as_object_mut() {
                obj.insert(
                    "best_product".to_string(),
                    json!({
                        "product_id": product.product_id,
                        "product_name": product.product_name,
                        "product_description": product.product_description,
                    }),
                );
            }
        } else {
            debug!("Could not resolve best_product_id {} against the catalog", key);
        }
    }

    /// Deterministic answer from the ranked candidates
    ///
    /// No scores are computed here; `top_candidates` carry null scores.
    fn fallback_answer(&self, top: &[Candidate]) -> Result<Value> {
        let best = self.retriever.get_product(top[0].row)?;

        let mut top_candidates = Vec::with_capacity(top.len());
        for candidate in top {
            let product = self.retriever.get_product(candidate.row)?;
            let product_id = match product.product_id.parse::<i64>() {
                Ok(numeric) => json!(numeric),
                Err(_) => json!(product.product_id),
            };
            top_candidates.push(json!({ "product_id": product_id, "score": null }));
        }

        Ok(json!({
            "best_product_id": best.product_id,
            "reasons": ["fallback: top match"],
            "top_candidates": top_candidates,
        }))
    }
}

/// Coerce whatever the generator returned to the canonical answer shape
///
/// A value with all three canonical keys passes through unchanged. A
/// `{"raw": <text>}` carrier gets one attempt at embedded-JSON extraction.
/// Everything else collapses to the minimal structured fallback.
pub fn normalize_generator_output(resp: &Value) -> Value {
    let empty = match resp {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        return json!({
            "best_product_id": null,
            "reasons": [],
            "top_candidates": [],
        });
    }

    if let Some(obj) = resp.as_object() {
        if obj.contains_key("best_product_id")
            && obj.contains_key("reasons")
            && obj.contains_key("top_candidates")
        {
            return resp.clone();
        }

        if let Some(raw) = obj.get("raw").and_then(Value::as_str) {
            if let Some(parsed) = extract_json_object(raw) {
                return parsed;
            }
            warn!("Could not parse JSON from raw LLM output");
        }
    }

    json!({
        "best_product_id": null,
        "reasons": ["no structured LLM output"],
        "top_candidates": [],
    })
}
