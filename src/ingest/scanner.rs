// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input discovery using the ignore crate (same as ripgrep)

use anyhow::{bail, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Expands `paths` into the list of files to ingest.
///
/// Files are taken as given. Directories are walked respecting `.gitignore`,
/// skipping hidden entries and any directory named `skip_dir` (the data
/// directory). The
/// result is sorted and deduplicated so ingestion order is stable.
pub fn collect_files(paths: &[PathBuf], skip_dir: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(walk_dir(path, skip_dir));
        } else {
            bail!("No such file or directory: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn walk_dir(root: &Path, skip_dir: &str) -> Vec<PathBuf> {
    let (tx, rx) = mpsc::channel();
    let skip_dir = skip_dir.to_string();

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_exclude(true)
        .filter_entry(move |entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| name != skip_dir)
                .unwrap_or(true)
        })
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();

        Box::new(move |entry| {
            if let Ok(entry) = entry {
                if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                    let _ = tx.send(entry.into_path());
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    rx.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collects_nested_files_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("sub").join("a.csv"), "a").unwrap();

        let files = collect_files(&[dir.path().to_path_buf()], ".docqa").unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("b.txt"), dir.path().join("sub").join("a.csv")]
        );
    }

    #[test]
    fn test_skips_data_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".docqa")).unwrap();
        fs::write(dir.path().join(".docqa").join("index_meta.json"), "[]").unwrap();
        fs::write(dir.path().join("doc.txt"), "text").unwrap();

        let files = collect_files(&[dir.path().to_path_buf()], ".docqa").unwrap();
        assert_eq!(files, vec![dir.path().join("doc.txt")]);
    }

    #[test]
    fn test_skips_hidden_entries_in_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join(".cache").join("blob.txt"), "x").unwrap();
        fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
        fs::write(dir.path().join("doc.txt"), "text").unwrap();

        let files = collect_files(&[dir.path().to_path_buf()], "store").unwrap();
        assert_eq!(files, vec![dir.path().join("doc.txt")]);

        let explicit = dir.path().join(".env");
        let files = collect_files(&[explicit.clone()], "store").unwrap();
        assert_eq!(files, vec![explicit]);
    }

    #[test]
    fn test_explicit_file_and_dedup() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("doc.txt");
        fs::write(&file, "text").unwrap();

        let files = collect_files(&[file.clone(), dir.path().to_path_buf()], ".docqa").unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(collect_files(&[dir.path().join("missing")], ".docqa").is_err());
    }
}
