//! Index build and status endpoints

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pipeline::PipelineState;
use crate::server::state::AppState;
use crate::types::{BuildSummary, IndexSummary};

/// Response body for `GET /api/status`
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub state: PipelineState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexSummary>,
    pub documents_dir: String,
    pub embedder: String,
    pub model: String,
    pub top_k: usize,
    pub started_at: DateTime<Utc>,
}

/// GET /api/status - Pipeline state and installed index
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let pipeline = state.pipeline();

    Json(StatusResponse {
        state: pipeline.state(),
        index: pipeline.current_index().map(|index| index.summary()),
        documents_dir: pipeline.source().location().display().to_string(),
        embedder: pipeline.embedder().name().to_string(),
        model: pipeline.synthesizer().model().to_string(),
        top_k: pipeline.top_k(),
        started_at: state.started_at(),
    })
}

/// POST /api/build - Rebuild the index from the documents directory
///
/// The build runs on its own task, so a client disconnect does not cancel it.
pub async fn build(State(state): State<AppState>) -> Result<Json<BuildSummary>> {
    tracing::info!("Index build requested");

    let summary = state
        .pipeline()
        .spawn_build()
        .await
        .map_err(|e| Error::Internal(format!("index build task failed: {}", e)))??;
    Ok(Json(summary))
}
