//! Answer generation prompts

pub mod prompt;

pub use prompt::{PromptBuilder, GROUNDING_INSTRUCTION};
