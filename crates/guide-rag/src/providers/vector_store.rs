//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use crate::error::Result;
use crate::types::{EvidenceChunk, RetrievedChunk};

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `InMemoryVectorStore`: brute-force cosine search held in memory
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Insert a chunk with its embedding
    async fn insert(&self, chunk: EvidenceChunk, embedding: Vec<f32>) -> Result<()>;

    /// Insert multiple chunks (batch)
    async fn insert_batch(&self, items: Vec<(EvidenceChunk, Vec<f32>)>) -> Result<()> {
        for (chunk, embedding) in items {
            self.insert(chunk, embedding).await?;
        }
        Ok(())
    }

    /// Search for the `top_k` most similar chunks, best first
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>>;

    /// Get total number of vectors stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}
