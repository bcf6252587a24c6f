//! Grounded answer generation

pub mod answer;
pub mod prompt;

pub use answer::AnsweringService;
pub use prompt::PromptBuilder;
