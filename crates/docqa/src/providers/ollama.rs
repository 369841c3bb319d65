//! Ollama-based providers for embeddings and answer generation

use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::OllamaConfig;
use crate::error::{ProviderErrorKind, Result};
use crate::generation::PromptBuilder;
use crate::types::Chunk;

use super::embedding::EmbeddingProvider;
use super::http::{Auth, HttpClient};
use super::llm::AnswerSynthesizer;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

/// Ollama API client with automatic retry
pub struct OllamaClient {
    http: HttpClient,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new("ollama", config.timeout_secs, config.max_retries)?,
            config: config.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Generate an embedding with the configured embedding model
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: &self.config.embed_model,
            prompt: text,
        };

        let response: EmbedResponse = self
            .http
            .post_json(&self.url("/api/embeddings"), Auth::None, &request)
            .await?;

        if response.embedding.is_empty() {
            return Err(self
                .http
                .error(ProviderErrorKind::InvalidResponse, "empty embedding"));
        }

        Ok(response.embedding)
    }

    /// Run a non-streaming completion
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.config.generate_model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
            },
        };

        tracing::info!("Generating answer with model: {}", self.config.generate_model);

        let response: GenerateResponse = self
            .http
            .post_json(&self.url("/api/generate"), Auth::None, &request)
            .await?;

        let answer = response.response.trim();
        if answer.is_empty() {
            return Err(self
                .http
                .error(ProviderErrorKind::InvalidResponse, "empty completion"));
        }

        Ok(answer.to_string())
    }
}

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    parallelism: usize,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        Ok(Self::from_client(
            Arc::new(OllamaClient::new(config)?),
            config.parallel_embeddings,
        ))
    }

    /// Create from an existing client
    pub fn from_client(client: Arc<OllamaClient>, parallelism: usize) -> Self {
        Self {
            client,
            parallelism: parallelism.max(1),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // No native batch endpoint; `buffered` keeps results in input order
        stream::iter(texts.to_vec())
            .map(|text| {
                let client = Arc::clone(&self.client);
                async move { client.embed(&text).await }
            })
            .buffered(self.parallelism)
            .try_collect()
            .await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama answer synthesizer
pub struct OllamaSynthesizer {
    client: Arc<OllamaClient>,
    model: String,
}

impl OllamaSynthesizer {
    /// Create from an existing client
    pub fn from_client(client: Arc<OllamaClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl AnswerSynthesizer for OllamaSynthesizer {
    async fn answer(&self, question: &str, context: &[Chunk]) -> Result<String> {
        let prompt = PromptBuilder::build_prompt(question, context);
        self.client.generate(&prompt).await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Embedder and synthesizer sharing one client
pub struct OllamaProvider {
    embedder: OllamaEmbedder,
    synthesizer: OllamaSynthesizer,
}

impl OllamaProvider {
    /// Create a combined Ollama provider
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let client = Arc::new(OllamaClient::new(config)?);
        Ok(Self {
            embedder: OllamaEmbedder::from_client(Arc::clone(&client), config.parallel_embeddings),
            synthesizer: OllamaSynthesizer::from_client(client, config.generate_model.clone()),
        })
    }

    /// Split into separate providers
    pub fn split(self) -> (OllamaEmbedder, OllamaSynthesizer) {
        (self.embedder, self.synthesizer)
    }
}
