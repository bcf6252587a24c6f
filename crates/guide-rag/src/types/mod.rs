//! Core types for the guide Q&A system

pub mod document;
pub mod response;

pub use document::{EvidenceChunk, ExtractedImage, ImageFormat, PageText};
pub use response::{Answer, LinkedImage, RetrievedChunk};
