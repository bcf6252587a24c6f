//! Retrieval over embedded guide chunks

pub mod index;

pub use index::EvidenceIndex;
