//! Ingestion pipeline orchestration

use std::path::{Path, PathBuf};

use crate::config::GuideConfig;
use crate::error::Result;
use crate::types::{EvidenceChunk, ExtractedImage};

use super::chunker::TextChunker;
use super::images::ImageExtractor;
use super::keywords::{KeywordImageMap, KeywordVocabulary};
use super::parser::PdfTextExtractor;

/// Everything derived from one pass over the guide
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    /// Source path
    pub path: PathBuf,
    /// Number of pages in the document
    pub total_pages: u32,
    /// Concatenated page text
    pub text: String,
    /// Keyword to first co-occurring image
    pub keyword_map: KeywordImageMap,
    /// Every image written to disk
    pub images: Vec<ExtractedImage>,
    /// Overlapping text chunks in document order
    pub chunks: Vec<EvidenceChunk>,
}

/// Main ingestion pipeline
pub struct IngestPipeline {
    /// Image extractor and keyword linker
    images: ImageExtractor,
    /// Text chunker
    chunker: TextChunker,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(images: ImageExtractor, chunker: TextChunker) -> Self {
        Self { images, chunker }
    }

    pub fn from_config(config: &GuideConfig) -> Result<Self> {
        let vocabulary = KeywordVocabulary::new(&config.document.keywords);
        Ok(Self::new(
            ImageExtractor::new(&config.document.image_dir, &vocabulary)?,
            TextChunker::from_config(&config.chunking)?,
        ))
    }

    /// Full ingestion: load once, extract text and images, chunk
    pub fn ingest(&self, path: &Path) -> Result<IngestedDocument> {
        let doc = PdfTextExtractor::load(path)?;
        let total_pages = doc.get_pages().len() as u32;

        let text = PdfTextExtractor::text_from_document(&doc);
        tracing::info!(
            "Extracted {} characters of text from {} pages",
            text.chars().count(),
            total_pages
        );

        tracing::info!("Writing images to {}", self.images.output_dir().display());
        let extraction = self.images.extract_from_document(&doc)?;

        let chunks = self.chunker.split(&text);
        tracing::info!(
            "Split text into {} chunks (size {}, overlap {})",
            chunks.len(),
            self.chunker.chunk_size(),
            self.chunker.overlap()
        );

        Ok(IngestedDocument {
            path: path.to_path_buf(),
            total_pages,
            text,
            keyword_map: extraction.keyword_map,
            images: extraction.images,
            chunks,
        })
    }
}
