// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered chunk metadata kept parallel to the vector index.
//!
//! Record `i` describes the vector stored at position `i`. Persisted as a
//! pretty-printed JSON array of `{ "text", "source" }` objects.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{RetrievalError, Result};
use crate::index::persist::{FreshReason, LoadOutcome};

/// Text and origin of one indexed chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub text: String,
    pub source: String,
}

impl ChunkRecord {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataStore {
    records: Vec<ChunkRecord>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, records: impl IntoIterator<Item = ChunkRecord>) {
        self.records.extend(records);
    }

    /// Returns the record at `position`.
    pub fn get(&self, position: usize) -> Result<&ChunkRecord> {
        self.records
            .get(position)
            .ok_or(RetrievalError::OutOfRange {
                position,
                len: self.records.len(),
            })
    }

    pub fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ChunkRecord] {
        &self.records
    }

    /// Serializes all records as a JSON array.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Writes the records to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Loads records from `path`; a missing or unparsable file yields an
    /// empty store.
    pub fn load(path: &Path) -> LoadOutcome<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return LoadOutcome::Fresh(Self::new(), FreshReason::Missing);
            }
            Err(err) => {
                return LoadOutcome::Fresh(Self::new(), FreshReason::Corrupt(err.to_string()));
            }
        };

        match serde_json::from_str::<Vec<ChunkRecord>>(&content) {
            Ok(records) => LoadOutcome::Loaded(Self { records }),
            Err(err) => LoadOutcome::Fresh(Self::new(), FreshReason::Corrupt(err.to_string())),
        }
    }
}
