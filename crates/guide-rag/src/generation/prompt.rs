//! Prompt templates for grounded answers

use crate::types::RetrievedChunk;

/// Prompt builder for guide questions
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build context from retrieved chunks, best match first
    pub fn build_context(results: &[RetrievedChunk]) -> String {
        results
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// System prompt that grounds the model in the retrieved guide text
    pub fn build_system_prompt(context: &str) -> String {
        format!(
            r#"You are a helpful assistant answering questions about an acne and skincare guide.

Use the following pieces of context from the guide to answer the user's question.
If the answer is not in the context, say that you don't know. Don't try to make up an answer.

----------------
{context}"#,
            context = context
        )
    }
}
