// SPDX-License-Identifier: MIT OR Apache-2.0

//! Utility functions for docqa

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// The name of the data directory holding the persisted index
pub const DATA_DIR: &str = ".docqa";

/// Find the nearest data directory by walking up from the given path.
/// Returns None if no such directory is found.
pub fn find_data_root(start: impl AsRef<Path>, dir_name: &str) -> Option<PathBuf> {
    let mut current = start.as_ref().to_path_buf();

    // Canonicalize to handle relative paths
    if let Ok(canonical) = current.canonicalize() {
        current = canonical;
    }

    loop {
        let data_path = current.join(dir_name);
        if data_path.is_dir() {
            return Some(data_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Get the data path for the given directory, walking up to find parent data dirs.
/// Falls back to `<path>/<dir_name>` if none is found anywhere.
pub fn get_data_path(path: impl AsRef<Path>, dir_name: &str) -> PathBuf {
    find_data_root(&path, dir_name).unwrap_or_else(|| path.as_ref().join(dir_name))
}

/// Runs `command` through `sh -c`, writes `payload` to its stdin and parses
/// its stdout as JSON.
pub fn run_json_command(command: &str, payload: &Value) -> Result<Value> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to spawn command: {}", command))?;

    if let Some(mut stdin) = child.stdin.take() {
        let payload_str = payload.to_string();
        stdin
            .write_all(payload_str.as_bytes())
            .context("Failed to write payload to stdin")?;
    }

    let output = child
        .wait_with_output()
        .context("Failed to read command output")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "Command failed (status {}): {}",
            output.status,
            stderr.trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).context("Failed to parse command output as JSON")
}
