// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector index and its parallel metadata store.
//!
//! The two are always handled as one unit by the retriever: vector `i` in
//! [`FlatIndex`] is described by record `i` in [`MetadataStore`].

pub mod flat;
pub mod metadata;
pub mod persist;

use std::path::Path;

use crate::errors::RetrievalError;

pub use flat::{FlatIndex, Neighbor};
pub use metadata::{ChunkRecord, MetadataStore};
pub use persist::{FreshReason, LoadOutcome};

/// Restores a vector index from `path`, falling back to an empty index of
/// `dimension` when the file is missing, unreadable or built for another
/// dimension.
pub fn load_index(path: &Path, dimension: usize) -> LoadOutcome<FlatIndex> {
    match FlatIndex::load(path) {
        Ok(index) if index.dimension() == dimension => LoadOutcome::Loaded(index),
        Ok(index) => LoadOutcome::Fresh(
            FlatIndex::new(dimension),
            FreshReason::DimensionMismatch {
                expected: dimension,
                found: index.dimension(),
            },
        ),
        Err(RetrievalError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            LoadOutcome::Fresh(FlatIndex::new(dimension), FreshReason::Missing)
        }
        Err(err) => LoadOutcome::Fresh(FlatIndex::new(dimension), FreshReason::Corrupt(err.to_string())),
    }
}
