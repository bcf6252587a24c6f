//! Retrieval-then-generation for a single question

use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::providers::LlmProvider;
use crate::retrieval::EvidenceIndex;
use crate::types::Answer;

use super::prompt::PromptBuilder;

/// Answers questions from the evidence index through a chat model
pub struct AnsweringService {
    index: Arc<EvidenceIndex>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl AnsweringService {
    pub fn new(index: Arc<EvidenceIndex>, llm: Arc<dyn LlmProvider>, top_k: usize) -> Self {
        Self { index, llm, top_k }
    }

    /// Retrieve the top-k chunks for `question` and ask the model.
    ///
    /// The model text is returned unmodified. Failures leave the index as it
    /// was, so the same question can be asked again.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(Error::EmptyQuestion);
        }

        let start = Instant::now();

        let evidence = self.index.retrieve(question, self.top_k).await?;
        tracing::debug!("Retrieved {} chunks for question", evidence.len());

        let context = PromptBuilder::build_context(&evidence);
        let text = self.llm.generate_answer(question, &context).await?;

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Answered with {} ({}) in {}ms",
            self.llm.name(),
            self.llm.model(),
            processing_time_ms
        );

        Ok(Answer {
            question: question.to_string(),
            text,
            evidence,
            images: Vec::new(),
            processing_time_ms,
        })
    }
}
