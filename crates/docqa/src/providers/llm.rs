//! Answer synthesizer trait for generating grounded answers

use async_trait::async_trait;
use crate::error::Result;
use crate::types::Chunk;

/// Trait for LLM-based answer generation over retrieved context
///
/// Implementations:
/// - `GroqSynthesizer`: Groq chat completions (gemma2-9b-it)
/// - `OllamaSynthesizer`: Local Ollama server
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    /// Answer `question` using only `context`, which is ordered most relevant first
    async fn answer(&self, question: &str, context: &[Chunk]) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
