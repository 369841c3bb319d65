//! Deterministic in-memory collaborators for pipeline and server tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::error::{Error, ProviderErrorKind, Result};
use crate::pipeline::{PipelineState, RetrievalPipeline};
use crate::providers::{AnswerSynthesizer, DocumentSource, EmbeddingProvider};
use crate::types::{Chunk, LoadedCorpus, Page};

/// Document source serving fixed pages
pub struct StaticSource {
    location: PathBuf,
    pages: Mutex<Vec<Page>>,
    failing: AtomicBool,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
    loads: AtomicUsize,
}

impl StaticSource {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            location: PathBuf::from("memory://corpus"),
            pages: Mutex::new(pages),
            failing: AtomicBool::new(false),
            gate: None,
            loads: AtomicUsize::new(0),
        }
    }

    /// One page per text, all from `doc.pdf`
    pub fn from_texts(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| Page::new("doc.pdf", i as u32, *t))
                .collect(),
        )
    }

    /// Signal `started` on entry to `load`, then wait for `release`
    pub fn gated(mut self, started: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.gate = Some((started, release));
        self
    }

    /// Make loads fail with a missing-directory error until reset
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_pages(&self, pages: Vec<Page>) {
        *self.pages.lock() = pages;
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    async fn load(&self) -> Result<LoadedCorpus> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        if let Some((started, release)) = &self.gate {
            started.notify_one();
            release.notified().await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::io(
                &self.location,
                std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
            ));
        }

        let pages = self.pages.lock().clone();
        Ok(LoadedCorpus {
            documents: 1,
            pages,
            skipped: Vec::new(),
        })
    }

    fn location(&self) -> &Path {
        &self.location
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Letter-frequency embedder: deterministic, and similar texts score higher
#[derive(Default)]
pub struct LetterEmbedder {
    fail_with: Mutex<Option<ProviderErrorKind>>,
    drop_last: Mutex<bool>,
    calls: AtomicUsize,
}

impl LetterEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call with `kind` (None to recover)
    pub fn set_failure(&self, kind: Option<ProviderErrorKind>) {
        *self.fail_with.lock() = kind;
    }

    /// Return one vector fewer than requested from `embed_batch`
    pub fn set_drop_last(&self, drop_last: bool) {
        *self.drop_last.lock() = drop_last;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; 26];
        for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
            v[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
        }
        v
    }

    fn check(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match *self.fail_with.lock() {
            Some(kind) => Err(Error::provider("stub", kind, "injected failure")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for LetterEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.check()?;
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.check()?;
        let mut vectors: Vec<Vec<f32>> = texts.iter().map(|t| Self::vector(t)).collect();
        if *self.drop_last.lock() {
            vectors.pop();
        }
        Ok(vectors)
    }

    fn name(&self) -> &str {
        "letters"
    }
}

/// Synthesizer that echoes the question and the sources it was given
#[derive(Default)]
pub struct EchoSynthesizer {
    fail_with: Mutex<Option<ProviderErrorKind>>,
    calls: AtomicUsize,
}

impl EchoSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failure(&self, kind: Option<ProviderErrorKind>) {
        *self.fail_with.lock() = kind;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerSynthesizer for EchoSynthesizer {
    async fn answer(&self, question: &str, context: &[Chunk]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = *self.fail_with.lock() {
            return Err(Error::provider("stub", kind, "injected failure"));
        }
        let sources: Vec<String> = context.iter().map(|c| c.index.to_string()).collect();
        Ok(format!("{} [{}]", question, sources.join(",")))
    }

    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        "echo-1"
    }
}

/// Poll until the pipeline reaches `state`; false after about five seconds
pub async fn wait_for_state(pipeline: &RetrievalPipeline, state: PipelineState) -> bool {
    for _ in 0..500 {
        if pipeline.state() == state {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
