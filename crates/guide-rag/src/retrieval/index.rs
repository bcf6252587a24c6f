//! Evidence index: chunks embedded once, searched per question

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::{EvidenceChunk, RetrievedChunk};

/// Embedded chunks of the guide plus the embedder used for queries
pub struct EvidenceIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    len: usize,
}

impl EvidenceIndex {
    /// Embed `chunks` in batches of `batch_size` and insert them into `store`.
    ///
    /// An empty chunk list gives an empty index; no embedding call is made.
    pub async fn build(
        chunks: Vec<EvidenceChunk>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        batch_size: usize,
    ) -> Result<Self> {
        if chunks.is_empty() {
            tracing::warn!("No text chunks to index; answers will have no grounding context");
            return Ok(Self {
                embedder,
                store,
                len: 0,
            });
        }

        let total = chunks.len();
        let batch_size = batch_size.max(1);
        let mut remaining = chunks.into_iter().peekable();
        let mut embedded = 0usize;

        while remaining.peek().is_some() {
            let batch: Vec<EvidenceChunk> = remaining.by_ref().take(batch_size).collect();
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = embedder.embed_batch(&texts).await?;

            if embeddings.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "{} returned {} embeddings for {} chunks",
                    embedder.name(),
                    embeddings.len(),
                    batch.len()
                )));
            }

            embedded += batch.len();
            store
                .insert_batch(batch.into_iter().zip(embeddings).collect())
                .await?;
            tracing::debug!("Embedded {}/{} chunks", embedded, total);
        }

        tracing::info!(
            "Built evidence index with {} chunks ({} embeddings, {} store)",
            total,
            embedder.name(),
            store.name()
        );

        Ok(Self {
            embedder,
            store,
            len: total,
        })
    }

    /// Top `k` chunks most similar to `query`, best first
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if self.len == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.embedder.embed(query).await?;
        self.store.search(&query_embedding, k).await
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
