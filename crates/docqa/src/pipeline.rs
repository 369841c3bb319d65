//! Retrieval pipeline: index construction and question answering
//!
//! `build` runs load → chunk → embed → index and swaps the finished index in
//! under a write lock. `query` clones the current index handle and works on
//! it without holding any lock, so a rebuild never blocks or disturbs
//! in-flight questions.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

use crate::config::DocQaConfig;
use crate::error::{Error, Result};
use crate::ingestion::{PdfDirectoryLoader, TextChunker};
use crate::providers::{self, AnswerSynthesizer, DocumentSource, EmbeddingProvider};
use crate::retrieval::VectorIndex;
use crate::types::{BuildSummary, Chunk, QueryResult};

/// Default number of chunks handed to the synthesizer
pub const DEFAULT_TOP_K: usize = 4;

/// Lifecycle of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    /// No index has been built
    Empty,
    /// A build is running
    Building,
    /// An index is installed and queryable
    Ready,
}

/// Clears the building flag when dropped, including on error or cancellation
struct BuildGuard<'a>(&'a AtomicBool);

impl<'a> BuildGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates index builds and queries
pub struct RetrievalPipeline {
    source: Arc<dyn DocumentSource>,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    synthesizer: Arc<dyn AnswerSynthesizer>,
    top_k: usize,
    index: RwLock<Option<Arc<VectorIndex>>>,
    building: AtomicBool,
}

impl RetrievalPipeline {
    /// Create a pipeline from its collaborators
    pub fn new(
        source: Arc<dyn DocumentSource>,
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        synthesizer: Arc<dyn AnswerSynthesizer>,
    ) -> Self {
        Self {
            source,
            chunker,
            embedder,
            synthesizer,
            top_k: DEFAULT_TOP_K,
            index: RwLock::new(None),
            building: AtomicBool::new(false),
        }
    }

    /// Create the PDF-directory pipeline described by `config`
    pub fn from_config(config: &DocQaConfig) -> Result<Self> {
        config.validate()?;

        let source = Arc::new(PdfDirectoryLoader::from_config(&config.documents));
        let chunker = TextChunker::from_config(&config.chunking)?;
        let (embedder, synthesizer) = providers::from_config(config)?;

        Ok(Self::new(source, chunker, embedder, synthesizer).with_top_k(config.retrieval.top_k))
    }

    /// Number of chunks retrieved per question
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Document source name and location
    pub fn source(&self) -> &dyn DocumentSource {
        self.source.as_ref()
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    pub fn synthesizer(&self) -> &dyn AnswerSynthesizer {
        self.synthesizer.as_ref()
    }

    /// Current lifecycle state
    pub fn state(&self) -> PipelineState {
        if self.building.load(Ordering::Acquire) {
            PipelineState::Building
        } else if self.index.read().is_some() {
            PipelineState::Ready
        } else {
            PipelineState::Empty
        }
    }

    /// The installed index, if any
    pub fn current_index(&self) -> Option<Arc<VectorIndex>> {
        self.index.read().clone()
    }

    /// Build a new index from the document source and install it
    ///
    /// On failure the previously installed index (if any) stays in place.
    pub async fn build(&self) -> Result<BuildSummary> {
        let _guard = BuildGuard::acquire(&self.building).ok_or(Error::AlreadyBuilding)?;
        let started = Instant::now();

        tracing::info!(
            "Building index from {} ({})",
            self.source.location().display(),
            self.source.name()
        );

        let corpus = self.source.load().await?;
        let pages = self.chunker.pages_used(corpus.pages.len());
        let chunks = self.chunker.split(&corpus.pages);

        if chunks.is_empty() {
            return Err(Error::EmptyCorpus(self.source.location().to_path_buf()));
        }

        tracing::info!(
            "Embedding {} chunks from {} pages with {}",
            chunks.len(),
            pages,
            self.embedder.name()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        let index = VectorIndex::build(chunks, vectors)?;
        let summary = index.summary();

        *self.index.write() = Some(Arc::new(index));

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "Index {} ready: {} chunks, {} dimensions in {}ms",
            summary.id,
            summary.chunks,
            summary.dimensions,
            elapsed_ms
        );

        Ok(BuildSummary {
            index: summary,
            documents: corpus.documents,
            pages,
            skipped: corpus.skipped,
            elapsed_ms,
        })
    }

    /// Run [`build`](Self::build) on its own task
    ///
    /// The build runs to completion even if the returned handle is dropped.
    pub fn spawn_build(self: &Arc<Self>) -> JoinHandle<Result<BuildSummary>> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move { pipeline.build().await })
    }

    /// Answer a question from the installed index
    pub async fn query(&self, question: &str) -> Result<QueryResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("question must not be empty".to_string()));
        }

        let index = self.current_index().ok_or(Error::NotReady)?;
        let started = Instant::now();

        let vector = self.embedder.embed(question).await?;
        let hits = index.query(&vector, self.top_k)?;
        let context: Vec<Chunk> = hits.iter().map(|h| h.chunk.clone()).collect();

        tracing::debug!(
            "Retrieved {} chunks (best similarity {:.3})",
            hits.len(),
            hits.first().map_or(0.0, |h| h.similarity)
        );

        let answer = self.synthesizer.answer(question, &context).await?;
        let elapsed = started.elapsed();

        tracing::info!(
            "Answered in {:.2}s with {} ({} context chunks)",
            elapsed.as_secs_f64(),
            self.synthesizer.model(),
            hits.len()
        );

        Ok(QueryResult {
            question: question.to_string(),
            answer,
            context: hits,
            elapsed,
            index_id: index.id(),
        })
    }
}
