//! Question answering endpoint

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{QueryResult, RetrievedChunk};

/// Request body for `POST /api/query`
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

/// One supporting passage, most similar first
#[derive(Debug, Serialize, Deserialize)]
pub struct SourcePassage {
    /// 1-based rank
    pub rank: usize,
    pub document: String,
    /// 1-based page number
    pub page: u32,
    pub chunk_index: usize,
    pub similarity: f32,
    pub text: String,
}

impl SourcePassage {
    fn from_hit(rank: usize, hit: &RetrievedChunk) -> Self {
        Self {
            rank,
            document: hit.chunk.source.document.clone(),
            page: hit.chunk.source.page_number + 1,
            chunk_index: hit.chunk.index,
            similarity: hit.similarity,
            text: hit.chunk.text.clone(),
        }
    }
}

/// Response body for `POST /api/query`
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub question: String,
    pub answer: String,
    pub elapsed_secs: f64,
    pub elapsed_ms: u64,
    pub index_id: Uuid,
    pub sources: Vec<SourcePassage>,
}

impl From<QueryResult> for QueryResponse {
    fn from(result: QueryResult) -> Self {
        Self {
            sources: result
                .context
                .iter()
                .enumerate()
                .map(|(i, hit)| SourcePassage::from_hit(i + 1, hit))
                .collect(),
            question: result.question,
            answer: result.answer,
            elapsed_secs: result.elapsed.as_secs_f64(),
            elapsed_ms: result.elapsed.as_millis() as u64,
            index_id: result.index_id,
        }
    }
}

/// POST /api/query - Answer a question from the current index
pub async fn query(
    State(state): State<AppState>,
    body: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>> {
    let Json(request) = body.map_err(|e| Error::InvalidInput(e.body_text()))?;

    tracing::info!("Query: \"{}\"", request.question.trim());

    let result = state.pipeline().query(&request.question).await?;
    Ok(Json(QueryResponse::from(result)))
}
