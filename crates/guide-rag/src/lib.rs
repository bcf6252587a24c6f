//! guide-rag: question answering over a single PDF skincare guide
//!
//! The guide is loaded once: page text is split into overlapping chunks and
//! embedded into an in-memory index, and embedded images are written to disk
//! and linked to the skincare keywords found on their page. Each question
//! retrieves the closest chunks, asks a hosted chat model for a grounded
//! answer, and attaches the images whose keyword the answer mentions.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod session;
pub mod types;

pub use config::GuideConfig;
pub use error::{Error, Result};
pub use session::GuideSession;
pub use types::{
    document::{EvidenceChunk, ExtractedImage, ImageFormat, PageText},
    response::{Answer, LinkedImage, RetrievedChunk},
};
