// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text chunker for embedding generation.
//!
//! Splits extracted document text into overlapping fixed-size character
//! windows. Windows are counted in Unicode scalar values so a chunk never
//! splits a code point.

use crate::errors::{RetrievalError, Result};

/// Default number of characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 800;

/// Default overlap between consecutive chunks, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Configuration for the text chunker.
///
/// Only constructible through [`ChunkConfig::new`] or `Default`, so the
/// window always advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    chunk_size: usize,
    overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkConfig {
    /// Creates a new ChunkConfig, rejecting windows that would not advance.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RetrievalError::InvalidConfig(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(RetrievalError::InvalidConfig(format!(
                "overlap ({}) must be less than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Number of characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of overlapping characters between consecutive chunks.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Number of characters each window advances by.
    pub fn step(&self) -> usize {
        self.chunk_size.saturating_sub(self.overlap).max(1)
    }
}

/// A chunk of text with its position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Starting character offset (0-indexed).
    pub start: usize,
    /// Ending character offset (exclusive).
    pub end: usize,
    /// The chunk text content.
    pub text: String,
}

/// Splits text into overlapping chunks for embedding generation.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingChunker {
    config: ChunkConfig,
}

impl EmbeddingChunker {
    /// Creates a new chunker with the given configuration.
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Creates a chunker with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Splits text into overlapping chunks.
    ///
    /// Algorithm:
    /// ```text
    /// start = 0
    /// step = chunk_size - overlap
    /// while start < total_chars:
    ///   end = min(start + chunk_size, total_chars)
    ///   emit chars[start..end]
    ///   start += step
    /// ```
    pub fn chunk_text(&self, content: &str) -> Vec<TextChunk> {
        if content.is_empty() || self.config.chunk_size == 0 {
            return Vec::new();
        }

        // Byte offset of every char boundary, plus the end of the string.
        let boundaries: Vec<usize> = content
            .char_indices()
            .map(|(idx, _)| idx)
            .chain(std::iter::once(content.len()))
            .collect();
        let total_chars = boundaries.len() - 1;

        let step = self.config.step();
        let mut chunks = Vec::with_capacity(total_chars / step + 1);
        let mut start = 0_usize;

        while start < total_chars {
            let end = (start + self.config.chunk_size).min(total_chars);
            chunks.push(TextChunk {
                start,
                end,
                text: content[boundaries[start]..boundaries[end]].to_string(),
            });
            start += step;
        }

        chunks
    }
}

/// Chunks `text` with explicit window parameters.
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<TextChunk>> {
    let config = ChunkConfig::new(chunk_size, overlap)?;
    Ok(EmbeddingChunker::new(config).chunk_text(text))
}
