//! In-memory vector store
//!
//! The guide is a single document of a few hundred chunks, so an exhaustive
//! cosine scan is enough.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::types::{EvidenceChunk, RetrievedChunk};

use super::vector_store::VectorStoreProvider;

struct StoredVector {
    chunk: EvidenceChunk,
    embedding: Vec<f32>,
    norm: f32,
}

/// Vector store holding every embedding in memory
#[derive(Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<StoredVector>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn dimensions(&self) -> Option<usize> {
        self.entries.read().first().map(|e| e.embedding.len())
    }
}

fn norm(vector: &[f32]) -> f32 {
    vector.iter().map(|v| v * v).sum::<f32>().sqrt()
}

/// Cosine similarity; zero vectors are dissimilar to everything
pub(crate) fn cosine_similarity(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (a_norm * b_norm)
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn insert(&self, chunk: EvidenceChunk, embedding: Vec<f32>) -> Result<()> {
        if embedding.is_empty() {
            return Err(Error::embedding(format!(
                "Chunk {} has an empty embedding",
                chunk.index
            )));
        }
        if let Some(dims) = self.dimensions() {
            if dims != embedding.len() {
                return Err(Error::embedding(format!(
                    "Embedding dimension mismatch: store has {}, chunk {} has {}",
                    dims,
                    chunk.index,
                    embedding.len()
                )));
            }
        }

        let norm = norm(&embedding);
        self.entries.write().push(StoredVector {
            chunk,
            embedding,
            norm,
        });
        Ok(())
    }

    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let entries = self.entries.read();
        if let Some(first) = entries.first() {
            if first.embedding.len() != query_embedding.len() {
                return Err(Error::embedding(format!(
                    "Query dimension {} does not match store dimension {}",
                    query_embedding.len(),
                    first.embedding.len()
                )));
            }
        }

        let query_norm = norm(query_embedding);
        let mut scored: Vec<RetrievedChunk> = entries
            .iter()
            .map(|entry| RetrievedChunk {
                chunk: entry.chunk.clone(),
                similarity: cosine_similarity(
                    query_embedding,
                    query_norm,
                    &entry.embedding,
                    entry.norm,
                ),
            })
            .collect();

        // Best first; ties keep document order
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then(a.chunk.index.cmp(&b.chunk.index))
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn name(&self) -> &str {
        "in-memory-cosine"
    }
}
