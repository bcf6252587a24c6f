//! Answer types returned to the presentation layer

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::document::EvidenceChunk;

/// Chunk returned by the evidence index with its similarity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// The matched chunk
    pub chunk: EvidenceChunk,
    /// Cosine similarity to the question (higher is closer)
    pub similarity: f32,
}

/// Image selected for display because its keyword appears in an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedImage {
    /// Keyword that linked the image
    pub keyword: String,
    /// Image location on disk
    pub path: PathBuf,
}

impl LinkedImage {
    /// Caption shown under the image, e.g. "Related: Benzoyl Peroxide"
    pub fn caption(&self) -> String {
        format!("Related: {}", title_case(&self.keyword))
    }
}

/// Result of answering one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The question as asked
    pub question: String,
    /// Model output, verbatim
    pub text: String,
    /// Chunks supplied as grounding context
    pub evidence: Vec<RetrievedChunk>,
    /// Illustrations whose keyword appears in the answer
    pub images: Vec<LinkedImage>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_title_cases_keyword() {
        let image = LinkedImage {
            keyword: "benzoyl peroxide".to_string(),
            path: PathBuf::from("images/page1_img1.jpeg"),
        };
        assert_eq!(image.caption(), "Related: Benzoyl Peroxide");
    }
}
