//! Provider abstractions for embeddings, answer generation, and vector storage
//!
//! The hosted services sit behind traits so the session can run against the
//! OpenAI-compatible API in production and against stubs in tests.

pub mod embedding;
pub mod llm;
pub mod memory;
pub mod openai;
pub mod retry;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use memory::InMemoryVectorStore;
pub use openai::{OpenAiClient, OpenAiEmbedder, OpenAiLlm, OpenAiProvider};
pub use retry::RetryPolicy;
pub use vector_store::VectorStoreProvider;
