// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the retrieval core.
//!
//! Only configuration-class failures are meant to cross the retriever
//! boundary. Corrupt persisted state, failed saves and stale positions are
//! absorbed by the retriever and never show up here as a returned error.

use thiserror::Error;

use crate::answer::AnswerStrategy;

/// Errors raised by the chunker, the vector index and the retriever.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Invalid configuration value (chunk sizes, provider settings)
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No usable embedding backend could be set up
    #[error("embedding backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Vector length does not match the index dimension
    #[error("dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// `texts` and `sources` passed to `add_documents` differ in length
    #[error("length mismatch: {texts} texts but {sources} sources")]
    LengthMismatch { texts: usize, sources: usize },

    /// The embedding provider returned the wrong number of vectors
    #[error("embedding provider returned {actual} vectors for {expected} texts")]
    EmbeddingCount { expected: usize, actual: usize },

    /// Metadata lookup past the end of the store
    #[error("position {position} out of range (size {len})")]
    OutOfRange { position: usize, len: usize },

    /// Persisted index blob could not be decoded
    #[error("invalid index file: {0}")]
    IndexFormat(String),

    /// The requested answer strategy has no model configured
    #[error("no model configured for the {0} answer strategy")]
    ModelNotConfigured(AnswerStrategy),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for retrieval core operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;
