//! Provider abstractions for documents, embeddings and answer generation
//!
//! The pipeline only sees the traits, so the hosted backend (Google
//! embeddings + Groq chat) and the local Ollama backend are interchangeable.

pub mod document_source;
pub mod embedding;
pub mod google;
pub mod groq;
pub mod http;
pub mod llm;
pub mod ollama;

pub use document_source::DocumentSource;
pub use embedding::EmbeddingProvider;
pub use google::GoogleEmbedder;
pub use groq::GroqSynthesizer;
pub use llm::AnswerSynthesizer;
pub use ollama::{OllamaEmbedder, OllamaProvider, OllamaSynthesizer};

use std::sync::Arc;

use crate::config::{BackendProvider, DocQaConfig};
use crate::error::Result;

/// Embedder and synthesizer selected by configuration
pub type ProviderPair = (Arc<dyn EmbeddingProvider>, Arc<dyn AnswerSynthesizer>);

/// Build the configured embedding and answer providers
pub fn from_config(config: &DocQaConfig) -> Result<ProviderPair> {
    match config.backend {
        BackendProvider::Hosted => {
            let embedder = GoogleEmbedder::new(&config.google)?;
            let synthesizer = GroqSynthesizer::new(&config.groq)?;
            tracing::info!(
                "Using hosted backend: {} embeddings, {} answers",
                embedder.model(),
                synthesizer.model()
            );
            let embedder: Arc<dyn EmbeddingProvider> = Arc::new(embedder);
            let synthesizer: Arc<dyn AnswerSynthesizer> = Arc::new(synthesizer);
            Ok((embedder, synthesizer))
        }
        BackendProvider::Ollama => {
            let (embedder, synthesizer) = OllamaProvider::new(&config.ollama)?.split();
            tracing::info!(
                "Using Ollama backend at {}: {} embeddings, {} answers",
                config.ollama.base_url,
                config.ollama.embed_model,
                config.ollama.generate_model
            );
            let embedder: Arc<dyn EmbeddingProvider> = Arc::new(embedder);
            let synthesizer: Arc<dyn AnswerSynthesizer> = Arc::new(synthesizer);
            Ok((embedder, synthesizer))
        }
    }
}
