//! Page and chunk types with source tracking

use serde::{Deserialize, Serialize};

/// One page of a source PDF
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Source document file name
    pub document: String,
    /// Page number within the document (0-based)
    pub page_number: u32,
    /// Extracted text (may be empty)
    pub text: String,
}

impl Page {
    /// Create a page record
    pub fn new(document: impl Into<String>, page_number: u32, text: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            page_number,
            text: text.into(),
        }
    }

    /// Whether the page has no indexable text
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Reference to this page for chunks cut from it
    pub fn source(&self) -> ChunkSource {
        ChunkSource {
            document: self.document.clone(),
            page_number: self.page_number,
        }
    }
}

/// Where a chunk came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Source document file name
    pub document: String,
    /// Page number within the document (0-based)
    pub page_number: u32,
}

impl std::fmt::Display for ChunkSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Pages are shown 1-based to readers
        write!(f, "{}, page {}", self.document, self.page_number + 1)
    }
}

/// A bounded window of one page's text, the unit of retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk in the corpus
    pub index: usize,
    /// Page this chunk was cut from
    pub source: ChunkSource,
    /// Chunk text
    pub text: String,
    /// Offset of the first character within the page text (in chars)
    pub start_offset: usize,
}

impl Chunk {
    /// Length of the chunk in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A file the loader could not use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    /// File name relative to the documents directory
    pub filename: String,
    /// Why it was skipped
    pub reason: String,
}

/// Output of a directory load
#[derive(Debug, Clone, Default)]
pub struct LoadedCorpus {
    /// Number of PDF files that produced pages
    pub documents: usize,
    /// Pages in deterministic order (file order, then page order)
    pub pages: Vec<Page>,
    /// Files that were skipped under the skip policy
    pub skipped: Vec<SkippedFile>,
}
