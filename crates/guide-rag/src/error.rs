//! Error types for the guide Q&A system

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for guide operations
pub type Result<T> = std::result::Result<T, Error>;

/// Guide system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The guide document is not present on disk
    #[error("Guide document not found: {}", .0.display())]
    MissingDocument(PathBuf),

    /// No API credential in the environment
    #[error("Missing API credential: set the {0} environment variable")]
    MissingCredential(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Image could not be re-encoded for storage
    #[error("Failed to encode image '{path}': {message}")]
    ImageEncode { path: String, message: String },

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Hosted chat model error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Credential rejected by the hosted service
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Hosted service refused the request due to rate limits or quota
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Hosted service failed on its side (5xx)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Hosted service did not answer in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Question was empty after trimming
    #[error("Question is empty")]
    EmptyQuestion,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an image encoding error
    pub fn image_encode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ImageEncode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Errors that stop the session before any ingestion happens
    pub fn is_startup_blocking(&self) -> bool {
        matches!(
            self,
            Error::MissingDocument(_) | Error::MissingCredential(_) | Error::Config(_)
        )
    }

    /// Errors worth retrying against a hosted service
    pub fn is_transient(&self) -> bool {
        match self {
            Error::RateLimited(_) | Error::Unavailable(_) | Error::Timeout(_) => true,
            Error::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }

    /// Errors raised by a hosted collaborator (embedding or chat)
    pub fn is_service(&self) -> bool {
        matches!(
            self,
            Error::Embedding(_)
                | Error::Llm(_)
                | Error::Auth(_)
                | Error::RateLimited(_)
                | Error::Unavailable(_)
                | Error::Timeout(_)
                | Error::Http(_)
        )
    }
}
