//! Core types for the document Q&A pipeline

pub mod document;
pub mod response;

pub use document::{Chunk, ChunkSource, LoadedCorpus, Page, SkippedFile};
pub use response::{BuildSummary, IndexSummary, QueryResult, RetrievedChunk};
