//! docqa: question answering over a directory of PDF documents
//!
//! Pages are extracted from every PDF in a folder, split into overlapping
//! fixed-size chunks and embedded into an in-memory cosine index. Questions
//! are embedded the same way; the closest chunks are handed to a language
//! model that answers from that context only.
//!
//! The embedding and answering services sit behind traits
//! ([`EmbeddingProvider`], [`AnswerSynthesizer`]) so the hosted backend
//! (Google embeddings + Groq chat) and a local Ollama server are
//! interchangeable.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::DocQaConfig;
pub use error::{Error, ProviderErrorKind, Result};
pub use pipeline::{PipelineState, RetrievalPipeline};
pub use providers::{AnswerSynthesizer, DocumentSource, EmbeddingProvider};
pub use retrieval::VectorIndex;
pub use types::{BuildSummary, Chunk, ChunkSource, Page, QueryResult, RetrievedChunk};
