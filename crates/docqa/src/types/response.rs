//! Result types returned by the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::document::{Chunk, SkippedFile};

/// A retrieved chunk with its similarity to the question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// The chunk
    pub chunk: Chunk,
    /// Cosine similarity (-1.0..=1.0, higher is more similar)
    pub similarity: f32,
}

/// Answer to one question
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// The question as asked (trimmed)
    pub question: String,
    /// Synthesized answer
    pub answer: String,
    /// Supporting context, most similar first
    pub context: Vec<RetrievedChunk>,
    /// Wall-clock time spent answering
    pub elapsed: Duration,
    /// Index that served the question
    pub index_id: Uuid,
}

impl QueryResult {
    /// Compare everything except the elapsed time
    pub fn same_content(&self, other: &QueryResult) -> bool {
        self.question == other.question
            && self.answer == other.answer
            && self.context == other.context
            && self.index_id == other.index_id
    }
}

/// Description of an installed index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSummary {
    /// Index identifier
    pub id: Uuid,
    /// Number of chunks
    pub chunks: usize,
    /// Vector dimensionality
    pub dimensions: usize,
    /// When the index was built
    pub built_at: DateTime<Utc>,
}

/// Outcome of a successful build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    /// The new index
    pub index: IndexSummary,
    /// PDF files that contributed pages
    pub documents: usize,
    /// Pages handed to the chunker after the page cap
    pub pages: usize,
    /// Files skipped by the loader
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub skipped: Vec<SkippedFile>,
    /// Build time in milliseconds
    pub elapsed_ms: u64,
}
