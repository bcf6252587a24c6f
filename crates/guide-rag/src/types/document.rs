//! Document, page, image, and chunk types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Text of a single page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Extracted text, empty for image-only pages
    pub content: String,
}

/// Native storage format of an embedded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// DCTDecode stream
    Jpeg,
    /// JPXDecode stream
    Jpx,
    /// JBIG2Decode stream
    Jbig2,
    /// CCITTFaxDecode stream
    Ccitt,
    /// Raw pixels re-encoded as PNG
    Png,
    /// Anything we cannot name
    Raw,
}

impl ImageFormat {
    /// File extension used when writing the image
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Jpx => "jpx",
            Self::Jbig2 => "jb2",
            Self::Ccitt => "ccitt",
            Self::Png => "png",
            Self::Raw => "bin",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Image written to the output directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// Page the image was found on (1-indexed)
    pub page_number: u32,
    /// Position within the page (1-indexed)
    pub image_index: u32,
    /// Stored format
    pub format: ImageFormat,
    /// Where the bytes were written
    pub path: PathBuf,
    /// Number of bytes written
    pub byte_len: usize,
}

impl ExtractedImage {
    /// File name following `page{N}_img{M}.{ext}`
    pub fn file_name(page_number: u32, image_index: u32, format: ImageFormat) -> String {
        format!("page{}_img{}.{}", page_number, image_index, format.extension())
    }
}

/// Contiguous slice of document text used as a retrieval unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceChunk {
    /// Position in chunk order (0-indexed)
    pub index: usize,
    /// Chunk text
    pub content: String,
    /// Start offset in characters
    pub char_start: usize,
    /// End offset in characters (exclusive)
    pub char_end: usize,
}

impl EvidenceChunk {
    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}
