//! Fixed-size overlapping text chunking with page tracking

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Chunk, Page};

/// Text chunker with configurable size, overlap and page cap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Characters shared by consecutive chunks
    overlap: usize,
    /// Pages beyond this prefix are ignored
    page_limit: Option<usize>,
}

impl TextChunker {
    /// Create a new chunker, rejecting `chunk_size == 0` and `overlap >= chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        Self::from_config(&ChunkingConfig {
            chunk_size,
            chunk_overlap: overlap,
            page_limit: None,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            page_limit: config.page_limit,
        })
    }

    /// Limit chunking to the first `limit` pages
    pub fn with_page_limit(mut self, limit: Option<usize>) -> Self {
        self.page_limit = limit;
        self
    }

    /// Number of pages that `split` will read from `total`
    pub fn pages_used(&self, total: usize) -> usize {
        self.page_limit.map_or(total, |limit| limit.min(total))
    }

    /// Split pages into chunks, page order first, then window order
    pub fn split(&self, pages: &[Page]) -> Vec<Chunk> {
        let used = &pages[..self.pages_used(pages.len())];
        let mut chunks = Vec::new();

        for page in used {
            if page.is_blank() {
                continue;
            }
            self.split_page(page, &mut chunks);
        }

        tracing::debug!(
            "Chunked {} of {} pages into {} chunks (size {}, overlap {})",
            used.len(),
            pages.len(),
            chunks.len(),
            self.chunk_size,
            self.overlap
        );

        chunks
    }

    /// Cut one page into windows; windows never cross the page boundary
    fn split_page(&self, page: &Page, out: &mut Vec<Chunk>) {
        // Byte offset of every char, plus the end of the text
        let boundaries: Vec<usize> = page
            .text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(page.text.len()))
            .collect();
        let char_count = boundaries.len() - 1;
        let step = self.chunk_size - self.overlap;

        let mut start = 0usize;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            out.push(Chunk {
                index: out.len(),
                source: page.source(),
                text: page.text[boundaries[start]..boundaries[end]].to_string(),
                start_offset: start,
            });

            if end == char_count {
                break;
            }
            start += step;
        }
    }
}
