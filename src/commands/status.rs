// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report what the persisted index holds without loading a model

use anyhow::Result;
use colored::Colorize;
use docqa::index::{FlatIndex, LoadOutcome, MetadataStore};
use docqa::output::{colorize_label, colorize_source, print_json, use_colors};
use serde::Serialize;
use std::collections::BTreeMap;

use super::CommandContext;

#[derive(Debug, Serialize)]
struct StatusReport {
    data_dir: String,
    index_file: String,
    metadata_file: String,
    /// "ok", "missing" or the decode error
    index_state: String,
    metadata_state: String,
    entries: usize,
    dimension: Option<usize>,
    metadata_records: usize,
    sources: BTreeMap<String, usize>,
}

/// Run the status command
pub fn run(ctx: &CommandContext) -> Result<()> {
    let paths = ctx.paths();

    let (index_state, entries, dimension) = if paths.index_path.exists() {
        match FlatIndex::load(&paths.index_path) {
            Ok(index) => ("ok".to_string(), index.len(), Some(index.dimension())),
            Err(err) => (err.to_string(), 0, None),
        }
    } else {
        ("missing".to_string(), 0, None)
    };

    let (metadata_state, metadata) = match MetadataStore::load(&paths.metadata_path) {
        LoadOutcome::Loaded(store) => ("ok".to_string(), store),
        LoadOutcome::Fresh(store, reason) => (reason.to_string(), store),
    };

    let mut sources = BTreeMap::new();
    for record in metadata.records() {
        *sources.entry(record.source.clone()).or_insert(0) += 1;
    }

    let report = StatusReport {
        data_dir: ctx.data_dir.display().to_string(),
        index_file: paths.index_path.display().to_string(),
        metadata_file: paths.metadata_path.display().to_string(),
        index_state,
        metadata_state,
        entries,
        dimension,
        metadata_records: metadata.len(),
        sources,
    };

    if ctx.is_json() {
        return print_json(&report, ctx.compact);
    }

    let color = use_colors();
    println!("{} {}", colorize_label("Data dir:", color), report.data_dir);
    println!(
        "{} {} ({}, dimension {})",
        colorize_label("Index:", color),
        report.entries,
        report.index_state,
        report
            .dimension
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "{} {} ({})",
        colorize_label("Metadata:", color),
        report.metadata_records,
        report.metadata_state
    );
    if report.entries != report.metadata_records {
        println!(
            "{} index and metadata sizes differ; unmatched entries are skipped at search time",
            "!".yellow()
        );
    }
    for (source, count) in &report.sources {
        println!("  {} ({} chunks)", colorize_source(source, color), count);
    }

    Ok(())
}
