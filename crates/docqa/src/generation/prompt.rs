//! Prompt templates for grounded question answering

use crate::types::Chunk;

/// Instruction that restricts the model to the retrieved context
pub const GROUNDING_INSTRUCTION: &str = "Answer the questions based on the provided context only.\n\
Please provide the most accurate response based on the question.\n\
If the context does not contain the answer, say that the provided documents do not cover it.";

/// Prompt builder for context-only answers
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render retrieved chunks in rank order, each labelled with its source
    pub fn build_context(chunks: &[Chunk]) -> String {
        let mut context = String::new();

        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 {
                context.push_str("\n\n");
            }
            context.push_str(&format!("[{}] {}\n{}", i + 1, chunk.source, chunk.text.trim()));
        }

        context
    }

    /// Build the full prompt for one question
    pub fn build_prompt(question: &str, chunks: &[Chunk]) -> String {
        format!(
            "{instruction}\n<context>\n{context}\n</context>\nQuestion: {question}",
            instruction = GROUNDING_INSTRUCTION,
            context = Self::build_context(chunks),
            question = question.trim()
        )
    }
}
