//! API routes for the document Q&A server

pub mod index;
pub mod query;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(index::status))
        .route("/build", post(index::build))
        .route("/query", post(query::query))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();

    Json(serde_json::json!({
        "name": "docqa",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": config.backend,
        "chunking": {
            "chunk_size": config.chunking.chunk_size,
            "chunk_overlap": config.chunking.chunk_overlap,
            "page_limit": config.chunking.page_limit,
        },
        "description": "Question answering over a directory of PDF documents",
        "endpoints": {
            "GET /api/status": "Pipeline state and current index",
            "POST /api/build": "Load, chunk and embed the documents, then swap in the new index",
            "POST /api/query": "Answer a question using only the retrieved passages",
            "GET /api/info": "This description"
        }
    }))
}
