//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers;
use super::handlers::AppState;

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Search endpoint
        .route("/search", post(handlers::search))
        // RAG endpoint
        .route("/rag", post(handlers::rag_answer))
        .with_state(state)
}

/// Health check router (outside the /api prefix)
pub fn health_routes() -> Router {
    Router::new().route("/health", get(handlers::health))
}
