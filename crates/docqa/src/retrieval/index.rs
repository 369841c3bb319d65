//! In-memory vector index with exact cosine search

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Chunk, IndexSummary, RetrievedChunk};

/// Immutable index of chunk embeddings
///
/// Built once from aligned chunks and vectors, then shared read-only between
/// queries. Search is a full scan, so results are exact.
#[derive(Debug)]
pub struct VectorIndex {
    id: Uuid,
    built_at: DateTime<Utc>,
    dimensions: usize,
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    norms: Vec<f32>,
}

impl VectorIndex {
    /// Build an index; `vectors[i]` must be the embedding of `chunks[i]`
    pub fn build(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(Error::dimension_mismatch(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                vectors.len()
            )));
        }

        let dimensions = vectors.first().map(Vec::len).unwrap_or(0);
        if !vectors.is_empty() && dimensions == 0 {
            return Err(Error::dimension_mismatch("embeddings are empty"));
        }

        if let Some((i, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dimensions) {
            return Err(Error::dimension_mismatch(format!(
                "embedding {} has {} dimensions, expected {}",
                i,
                v.len(),
                dimensions
            )));
        }

        let norms = vectors.iter().map(|v| norm(v)).collect();

        Ok(Self {
            id: Uuid::new_v4(),
            built_at: Utc::now(),
            dimensions,
            chunks,
            vectors,
            norms,
        })
    }

    /// Return the `k` chunks most similar to `query`, most similar first
    ///
    /// Equal similarities keep insertion order. Fewer than `k` results are
    /// returned when the index is smaller than `k`.
    pub fn query(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Err(Error::InvalidInput("k must be at least 1".to_string()));
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(Error::dimension_mismatch(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let query_norm = norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .zip(&self.norms)
            .enumerate()
            .map(|(i, (v, &n))| (i, cosine(query, query_norm, v, n)))
            .collect();

        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, similarity)| RetrievedChunk {
                chunk: self.chunks[i].clone(),
                similarity,
            })
            .collect())
    }

    /// Index identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Embedding dimensionality (0 for an empty index)
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Summary for status reporting
    pub fn summary(&self) -> IndexSummary {
        IndexSummary {
            id: self.id,
            chunks: self.len(),
            dimensions: self.dimensions,
            built_at: self.built_at,
        }
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Zero vectors have no direction; they score 0.0 against everything
fn cosine(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let similarity = dot / (a_norm * b_norm);
    // -0.0 sorts below 0.0 under total_cmp
    if similarity.is_nan() || similarity == 0.0 {
        0.0
    } else {
        similarity.clamp(-1.0, 1.0)
    }
}
