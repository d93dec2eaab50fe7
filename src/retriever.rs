// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval service: owns the embedding provider, the vector index and the
//! metadata store, and keeps the latter two aligned position by position.
//!
//! Restoring persisted state is fail-open and saving is best-effort; only
//! configuration-class failures and provider failures surface as errors.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::embedding::EmbeddingProvider;
use crate::errors::RetrievalError;
use crate::index::persist::{remove_if_exists, write_atomic};
use crate::index::{load_index, ChunkRecord, FlatIndex, LoadOutcome, MetadataStore};

/// Where the index blob and the metadata JSON live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieverPaths {
    pub index_path: PathBuf,
    pub metadata_path: PathBuf,
}

impl RetrieverPaths {
    pub fn new(index_path: impl Into<PathBuf>, metadata_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            metadata_path: metadata_path.into(),
        }
    }

    /// Both files inside `data_dir` under the given names.
    pub fn in_dir(data_dir: &Path, index_file: &str, metadata_file: &str) -> Self {
        Self::new(data_dir.join(index_file), data_dir.join(metadata_file))
    }
}

/// One retrieved chunk. `score` is the squared L2 distance to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub score: f32,
    pub text: String,
    pub source: String,
}

/// Which halves of a [`Retriever::save`] reached disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub index_saved: bool,
    pub metadata_saved: bool,
}

impl SaveOutcome {
    pub fn is_complete(&self) -> bool {
        self.index_saved && self.metadata_saved
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrieverStats {
    pub entries: usize,
    pub metadata_records: usize,
    pub dimension: usize,
    pub model_id: String,
    /// Whether both the index and the metadata were restored from disk at open
    pub restored: bool,
}

struct IndexState {
    index: FlatIndex,
    metadata: MetadataStore,
}

impl IndexState {
    fn empty(dimension: usize) -> Self {
        Self {
            index: FlatIndex::new(dimension),
            metadata: MetadataStore::new(),
        }
    }

    /// Cuts the longer side back to the shared prefix. Both sides only ever
    /// grow by appending, so position `i` still pairs vector and record.
    fn aligned(mut self) -> Self {
        let (vectors, records) = (self.index.len(), self.metadata.len());
        if vectors != records {
            let shared = vectors.min(records);
            tracing::warn!(
                "Index holds {} vectors but metadata holds {} records; keeping the first {}",
                vectors,
                records,
                shared
            );
            self.index.truncate(shared);
            self.metadata.truncate(shared);
        }
        self
    }
}

pub struct Retriever {
    paths: RetrieverPaths,
    dimension: usize,
    model_id: String,
    restored: bool,
    provider: Mutex<Box<dyn EmbeddingProvider>>,
    state: Mutex<IndexState>,
}

impl Retriever {
    /// Builds the service, restoring persisted state when it is usable.
    ///
    /// A provider reporting dimension 0 is rejected. A missing, unreadable or
    /// differently-dimensioned index file, or an unreadable metadata file,
    /// starts both halves empty so positions never pair stale records with
    /// new vectors. Two restored files of different lengths keep their common
    /// prefix.
    pub fn open(paths: RetrieverPaths, provider: Box<dyn EmbeddingProvider>) -> Result<Self> {
        let dimension = provider.dimension();
        if dimension == 0 {
            return Err(RetrievalError::BackendUnavailable(format!(
                "provider '{}' reports embedding dimension 0",
                provider.model_id()
            ))
            .into());
        }
        let model_id = provider.model_id().to_string();

        let index = load_index(&paths.index_path, dimension);
        let metadata = MetadataStore::load(&paths.metadata_path);
        let restored = index.is_loaded() && metadata.is_loaded();

        match &index {
            LoadOutcome::Loaded(index) => {
                tracing::info!(
                    "Restored {} vectors from {}",
                    index.len(),
                    paths.index_path.display()
                );
            }
            LoadOutcome::Fresh(_, reason) => {
                tracing::warn!(
                    "Starting with an empty index ({}: {})",
                    paths.index_path.display(),
                    reason
                );
            }
        }
        if let LoadOutcome::Fresh(_, reason) = &metadata {
            tracing::warn!(
                "Starting with empty metadata ({}: {})",
                paths.metadata_path.display(),
                reason
            );
        }

        let state = if restored {
            IndexState {
                index: index.into_inner(),
                metadata: metadata.into_inner(),
            }
            .aligned()
        } else {
            let (index, metadata) = (index.into_inner(), metadata.into_inner());
            if !index.is_empty() || !metadata.is_empty() {
                tracing::warn!(
                    "Discarding {} vectors and {} metadata records restored without their counterpart",
                    index.len(),
                    metadata.len()
                );
            }
            IndexState::empty(dimension)
        };

        Ok(Self {
            paths,
            dimension,
            model_id,
            restored,
            provider: Mutex::new(provider),
            state: Mutex::new(state),
        })
    }

    pub fn paths(&self) -> &RetrieverPaths {
        &self.paths
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of vectors in the index.
    pub fn len(&self) -> usize {
        self.lock_state().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> RetrieverStats {
        let state = self.lock_state();
        RetrieverStats {
            entries: state.index.len(),
            metadata_records: state.metadata.len(),
            dimension: self.dimension,
            model_id: self.model_id.clone(),
            restored: self.restored,
        }
    }

    /// Embeds `texts` and appends them with their `sources`; returns how many
    /// entries were added. Nothing is written to disk.
    pub fn add_documents(&self, texts: &[String], sources: &[String]) -> Result<usize> {
        if texts.len() != sources.len() {
            return Err(RetrievalError::LengthMismatch {
                texts: texts.len(),
                sources: sources.len(),
            }
            .into());
        }
        if texts.is_empty() {
            return Ok(0);
        }

        let vectors = self
            .lock_provider()
            .embed_texts(texts)
            .context("Failed to embed documents")?;
        if vectors.len() != texts.len() {
            return Err(RetrievalError::EmbeddingCount {
                expected: texts.len(),
                actual: vectors.len(),
            }
            .into());
        }

        let mut state = self.lock_state();
        state.index.add(&vectors)?;
        state.metadata.append(
            texts
                .iter()
                .zip(sources)
                .map(|(text, source)| ChunkRecord::new(text.as_str(), source.as_str())),
        );
        tracing::debug!("Added {} entries (total {})", texts.len(), state.index.len());

        Ok(texts.len())
    }

    /// Returns up to `top_k` chunks closest to `query`, closest first.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self
            .lock_provider()
            .embed_one(query)
            .context("Failed to embed query")?;

        let state = self.lock_state();
        let neighbors = state.index.search(&embedding, top_k)?;
        let hits: Vec<SearchHit> = neighbors
            .into_iter()
            .filter_map(|neighbor| match state.metadata.get(neighbor.position) {
                Ok(record) => Some(SearchHit {
                    score: neighbor.distance,
                    text: record.text.clone(),
                    source: record.source.clone(),
                }),
                Err(err) => {
                    tracing::debug!("Skipping search result: {}", err);
                    None
                }
            })
            .collect();

        tracing::debug!("Search returned {} hits for top_k={}", hits.len(), top_k);
        Ok(hits)
    }

    /// Writes the index and metadata to their paths. Failures are logged and
    /// reported in the outcome, never returned.
    pub fn save(&self) -> SaveOutcome {
        let state = self.lock_state();
        let outcome = save_state(&self.paths, &state);
        if outcome.is_complete() {
            tracing::info!("Saved {} entries", state.index.len());
        }
        outcome
    }

    /// Replaces the state with an empty index and store. With
    /// `remove_persisted`, both files are deleted as well.
    pub fn reset(&self, remove_persisted: bool) {
        let mut state = self.lock_state();
        *state = IndexState::empty(self.dimension);

        if remove_persisted {
            remove_files(&self.paths);
        }
        tracing::info!("Index reset (files removed: {})", remove_persisted);
    }

    fn lock_state(&self) -> MutexGuard<'_, IndexState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_provider(&self) -> MutexGuard<'_, Box<dyn EmbeddingProvider>> {
        self.provider
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Deletes both persisted files without opening a provider. Missing files
/// are fine; other failures are logged.
pub fn remove_persisted(paths: &RetrieverPaths) {
    remove_files(paths);
    tracing::info!("Removed persisted index under {}", paths.index_path.display());
}

/// Writes an empty index of `dimension` and an empty metadata store over the
/// persisted files without opening a provider.
pub fn write_empty(paths: &RetrieverPaths, dimension: usize) -> SaveOutcome {
    save_state(paths, &IndexState::empty(dimension))
}

fn remove_files(paths: &RetrieverPaths) {
    for path in [&paths.index_path, &paths.metadata_path] {
        if let Err(err) = remove_if_exists(path) {
            tracing::warn!("Failed to remove {}: {}", path.display(), err);
        }
    }
}

fn save_state(paths: &RetrieverPaths, state: &IndexState) -> SaveOutcome {
    let index_saved = match write_atomic(&paths.index_path, |tmp| {
        state.index.save(tmp).map_err(into_io)
    }) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                "Failed to save index to {}: {}",
                paths.index_path.display(),
                err
            );
            false
        }
    };

    let metadata_saved = match write_atomic(&paths.metadata_path, |tmp| {
        state.metadata.save(tmp).map_err(into_io)
    }) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                "Failed to save metadata to {}: {}",
                paths.metadata_path.display(),
                err
            );
            false
        }
    };

    SaveOutcome {
        index_saved,
        metadata_saved,
    }
}

fn into_io(err: RetrievalError) -> std::io::Error {
    match err {
        RetrievalError::Io(err) => err,
        other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
    }
}
