//! Document ingestion: text, images, keyword links, and chunks

mod chunker;
mod images;
pub mod keywords;
mod parser;
mod processor;

pub use chunker::TextChunker;
pub use images::{ImageExtraction, ImageExtractor};
pub use keywords::{KeywordImageMap, KeywordMatcher, KeywordVocabulary, DEFAULT_KEYWORDS};
pub use parser::PdfTextExtractor;
pub use processor::{IngestPipeline, IngestedDocument};
