//! Google Generative Language embeddings (embedding-001)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GoogleConfig;
use crate::error::{Error, ProviderErrorKind, Result};

use super::embedding::EmbeddingProvider;
use super::http::{Auth, HttpClient};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Task type hints understood by the embedding API
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalQuery,
    RetrievalDocument,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

/// Embedding provider backed by the Google Generative Language API
pub struct GoogleEmbedder {
    http: HttpClient,
    base_url: String,
    model: String,
    api_key: String,
    batch_size: usize,
}

impl GoogleEmbedder {
    /// Create from configuration; fails without an API key
    pub fn new(config: &GoogleConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("GOOGLE_API_KEY is not set".to_string()))?;

        if config.batch_size == 0 || config.batch_size > 100 {
            return Err(Error::Config(format!(
                "google.batch_size must be within 1..=100, got {}",
                config.batch_size
            )));
        }

        Ok(Self {
            http: HttpClient::new("google", config.timeout_secs, config.max_retries)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: normalize_model(&config.embedding_model),
            api_key,
            batch_size: config.batch_size,
        })
    }

    /// Model resource name
    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, self.model, method)
    }

    fn request<'a>(&'a self, text: &'a str, task_type: TaskType) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: &self.model,
            content: Content {
                parts: [Part { text }],
            },
            task_type,
        }
    }

    async fn embed_group(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|t| self.request(t, TaskType::RetrievalDocument))
                .collect(),
        };

        let response: BatchEmbedResponse = self
            .http
            .post_json(
                &self.url("batchEmbedContents"),
                Auth::Header(API_KEY_HEADER, &self.api_key),
                &body,
            )
            .await?;

        if response.embeddings.len() != texts.len() {
            return Err(self.http.error(
                ProviderErrorKind::InvalidResponse,
                format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    response.embeddings.len()
                ),
            ));
        }

        response
            .embeddings
            .into_iter()
            .map(|e| self.non_empty(e.values))
            .collect()
    }

    fn non_empty(&self, values: Vec<f32>) -> Result<Vec<f32>> {
        if values.is_empty() {
            Err(self
                .http
                .error(ProviderErrorKind::InvalidResponse, "empty embedding"))
        } else {
            Ok(values)
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GoogleEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response: EmbedContentResponse = self
            .http
            .post_json(
                &self.url("embedContent"),
                Auth::Header(API_KEY_HEADER, &self.api_key),
                &self.request(text, TaskType::RetrievalQuery),
            )
            .await?;

        self.non_empty(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for (i, group) in texts.chunks(self.batch_size).enumerate() {
            tracing::debug!(
                "Embedding batch {} ({} texts) with {}",
                i + 1,
                group.len(),
                self.model
            );
            embeddings.extend(self.embed_group(group).await?);
        }

        Ok(embeddings)
    }

    fn name(&self) -> &str {
        "google"
    }
}

/// Accept both `embedding-001` and `models/embedding-001`
fn normalize_model(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}
