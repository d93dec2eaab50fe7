// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding module - turns document text into vectors
//!
//! The chunker cuts extracted text into overlapping windows; a provider maps
//! each window to a fixed-dimension vector for the index.

pub mod chunker;
pub mod provider;

pub use chunker::{chunk, ChunkConfig, EmbeddingChunker, TextChunk};
pub use provider::{
    build_provider, CommandProvider, DummyProvider, EmbeddingProvider, EmbeddingProviderConfig,
    FastEmbedder, HashProvider, DEFAULT_EMBEDDING_DIM,
};
