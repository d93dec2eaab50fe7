// SPDX-License-Identifier: MIT OR Apache-2.0

//! Restore outcomes and file writes shared by the index and metadata store.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Why a fresh value was created instead of restoring persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreshReason {
    /// Nothing persisted at the path
    Missing,
    /// The file exists but could not be read or decoded
    Corrupt(String),
    /// The persisted index was built for another embedding dimension
    DimensionMismatch { expected: usize, found: usize },
}

impl fmt::Display for FreshReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreshReason::Missing => write!(f, "missing"),
            FreshReason::Corrupt(reason) => write!(f, "corrupt ({})", reason),
            FreshReason::DimensionMismatch { expected, found } => {
                write!(f, "dimension {} does not match provider dimension {}", found, expected)
            }
        }
    }
}

/// Result of restoring persisted state with the fail-open policy: either the
/// persisted value, or a fresh empty one plus the reason it was used.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    Loaded(T),
    Fresh(T, FreshReason),
}

impl<T> LoadOutcome<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            LoadOutcome::Loaded(value) | LoadOutcome::Fresh(value, _) => value,
        }
    }
}

/// Runs `write` against a sibling temp file, then renames it over `path`.
/// A failed write leaves any previous file at `path` untouched.
pub fn write_atomic(path: &Path, write: impl FnOnce(&Path) -> std::io::Result<()>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path(path);
    if let Err(err) = write(&tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path)
}

/// Removes `path`, treating an already-missing file as success.
pub fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
