//! LLM provider trait for generating answers

use async_trait::async_trait;
use crate::error::Result;

/// Trait for grounded answer generation
///
/// Implementations:
/// - `OpenAiLlm`: hosted OpenAI-compatible `/chat/completions` endpoint
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate an answer to `question` grounded in `context`.
    ///
    /// Returns the model text verbatim.
    async fn generate_answer(&self, question: &str, context: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
