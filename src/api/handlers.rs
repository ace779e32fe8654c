//! API request handlers

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use tracing::error;
use tracing::info;

use crate::api::types::ApiResponse;
use crate::api::types::HealthResponse;
use crate::api::types::RagRequest;
use crate::api::types::SearchRequest;
use crate::api::types::SearchResponse;
use crate::errors::ProdragError;
use crate::rag::RagService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub rag_service: Arc<RagService>,
}

/// Health check handler
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Product search (POST /api/search)
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<ApiResponse<SearchResponse>>, (StatusCode, Json<ApiResponse<SearchResponse>>)> {
    info!("POST /api/search: {}", req.query);

    match state
        .rag_service
        .search(&req.query, req.top_k, req.rerank_m, req.use_rerank)
        .await
    {
        Ok(results) => Ok(Json(ApiResponse::success(SearchResponse {
            query: req.query,
            results,
        }))),
        Err(e) => {
            error!("Error processing search: {}", e);
            Err((status_for(&e), Json(ApiResponse::error(e.to_string()))))
        }
    }
}

/// RAG answer (POST /api/rag)
pub async fn rag_answer(
    State(state): State<AppState>,
    Json(req): Json<RagRequest>,
) -> Result<Json<Value>, (StatusCode, Json<ApiResponse<Value>>)> {
    info!("POST /api/rag: {}", req.query);

    match state
        .rag_service
        .answer_with_options(&req.query, req.top_k, req.rerank_m)
        .await
    {
        Ok(answer) => Ok(Json(answer)),
        Err(e) => {
            error!("Error processing RAG query: {}", e);
            Err((status_for(&e), Json(ApiResponse::error(e.to_string()))))
        }
    }
}

/// Map pipeline errors to HTTP status codes
fn status_for(error: &ProdragError) -> StatusCode {
    match error {
        ProdragError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
