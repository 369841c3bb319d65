//! Groq chat completions (OpenAI-compatible API)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GroqConfig;
use crate::error::{Error, ProviderErrorKind, Result};
use crate::generation::PromptBuilder;
use crate::types::Chunk;

use super::http::{Auth, HttpClient};
use super::llm::AnswerSynthesizer;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_answer(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// Answer synthesizer backed by Groq
pub struct GroqSynthesizer {
    http: HttpClient,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
}

impl GroqSynthesizer {
    /// Create from configuration; fails without an API key
    pub fn new(config: &GroqConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("GROQ_API_KEY is not set".to_string()))?;

        Ok(Self {
            http: HttpClient::new("groq", config.timeout_secs, config.max_retries)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        }
    }
}

#[async_trait]
impl AnswerSynthesizer for GroqSynthesizer {
    async fn answer(&self, question: &str, context: &[Chunk]) -> Result<String> {
        let prompt = PromptBuilder::build_prompt(question, context);
        let url = format!("{}/chat/completions", self.base_url);

        tracing::info!("Generating answer with model: {}", self.model);

        let response: ChatResponse = self
            .http
            .post_json(&url, Auth::Bearer(&self.api_key), &self.request(&prompt))
            .await?;

        response.into_answer().ok_or_else(|| {
            self.http
                .error(ProviderErrorKind::InvalidResponse, "response contained no answer")
        })
    }

    fn name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GroqConfig {
        GroqConfig {
            api_key: Some("gsk_test".to_string()),
            ..GroqConfig::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            GroqSynthesizer::new(&GroqConfig::default()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_request_shape() {
        let synth = GroqSynthesizer::new(&config()).unwrap();
        let body = serde_json::to_value(synth.request("prompt text")).unwrap();

        assert_eq!(body["model"], "gemma2-9b-it");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "prompt text");
        assert_eq!(body["stream"], false);
        assert_eq!(body["max_tokens"], 1024);
    }

    #[test]
    fn test_parse_answer() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"  42 people.  "}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_answer().as_deref(), Some("42 people."));
    }

    #[test]
    fn test_missing_answer() {
        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(empty.into_answer().is_none());

        let null: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(null.into_answer().is_none());
    }
}
