//! Greedy fixed-size text chunking with character overlap

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::EvidenceChunk;

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Characters shared with the previous chunk
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; `overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(Error::Config(format!(
                "Invalid chunking: size {} with overlap {}",
                chunk_size, overlap
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into chunks.
    ///
    /// Chunk 0 covers `[0, size)`; each following chunk starts `overlap`
    /// characters before the previous end. The last chunk ends at the end of
    /// the text. Offsets count `char`s, so multi-byte text is never cut inside
    /// a code point.
    pub fn split(&self, text: &str) -> Vec<EvidenceChunk> {
        // Byte offset of every char boundary, including the end of the text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = boundaries.len() - 1;

        let mut chunks = Vec::new();
        if total == 0 {
            return chunks;
        }

        let mut start = 0usize;
        loop {
            let end = (start + self.chunk_size).min(total);
            chunks.push(EvidenceChunk {
                index: chunks.len(),
                content: text[boundaries[start]..boundaries[end]].to_string(),
                char_start: start,
                char_end: end,
            });

            if end == total {
                break;
            }
            start = end - self.overlap;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stitch(chunks: &[EvidenceChunk], overlap: usize) -> String {
        let mut text = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                text.push_str(&chunk.content);
            } else {
                text.extend(chunk.content.chars().skip(overlap));
            }
        }
        text
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let chunker = TextChunker::new(1000, 200).unwrap();
        assert!(chunker.split("").is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunker = TextChunker::new(1000, 200).unwrap();
        let chunks = chunker.split("Use benzoyl peroxide twice daily");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Use benzoyl peroxide twice daily");
        assert_eq!(chunks[0].char_start, 0);
    }

    #[test]
    fn test_chunk_boundaries() {
        let chunker = TextChunker::new(10, 3).unwrap();
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunker.split(text);

        let spans: Vec<(usize, usize)> =
            chunks.iter().map(|c| (c.char_start, c.char_end)).collect();
        assert_eq!(spans, vec![(0, 10), (7, 17), (14, 24), (21, 26)]);
        assert_eq!(chunks[1].content, "hijklmnopq");
        assert!(chunks.iter().all(|c| c.char_len() <= 10));
        assert_eq!(chunks.iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_exact_fit_does_not_emit_overlap_only_chunk() {
        let chunker = TextChunker::new(5, 2).unwrap();
        let chunks = chunker.split("abcde");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_multibyte_characters() {
        let chunker = TextChunker::new(4, 1).unwrap();
        let text = "crème brûlée ✓";
        let chunks = chunker.split(text);
        assert_eq!(stitch(&chunks, 1), text);
        assert_eq!(chunks[0].content, "crèm");
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(100, 100).is_err());
        assert!(TextChunker::new(100, 99).is_ok());
    }

    proptest! {
        #[test]
        fn prop_stitching_reconstructs_text(
            text in "\\PC{0,400}",
            size in 1usize..64,
            overlap_seed in 0usize..64,
        ) {
            let overlap = overlap_seed % size;
            let chunker = TextChunker::new(size, overlap).unwrap();
            let chunks = chunker.split(&text);

            prop_assert_eq!(stitch(&chunks, overlap), text.clone());
            for chunk in &chunks {
                prop_assert!(chunk.char_len() <= size);
            }
        }
    }
}
