// SPDX-License-Identifier: MIT OR Apache-2.0

//! Index files into the vector store

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use super::CommandContext;
use docqa::ingest::collect_files;
use docqa::output::{colorize_source, print_json, use_colors};
use docqa::utils::DATA_DIR;

/// Run the index command
pub fn run(ctx: &CommandContext, paths: &[PathBuf], append: bool) -> Result<()> {
    let skip_dir = ctx
        .data_dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DATA_DIR);
    let files = collect_files(paths, skip_dir)?;
    let pipeline = ctx.open_pipeline()?;

    let pb = if ctx.is_json() {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(files.len() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} files | Indexing {msg}")?
            .progress_chars("##."),
    );

    let report = pipeline.ingest_files_with_progress(&files, !append, |path, _| {
        pb.set_message(path.display().to_string());
        pb.inc(1);
    })?;
    pb.finish_and_clear();

    if ctx.is_json() {
        return print_json(&report, ctx.compact);
    }

    let color = use_colors();
    for file in &report.files {
        println!("  {} ({} chunks)", colorize_source(&file.path, color), file.chunks);
    }
    for skipped in &report.skipped {
        println!(
            "  {} {} skipped: {}",
            "✗".red(),
            colorize_source(&skipped.path, color),
            skipped.reason
        );
    }
    println!(
        "{} Indexed {} chunks from {} files ({} entries total)",
        "✓".green(),
        report.total_chunks,
        report.files.len(),
        report.index_size
    );
    if !report.saved.is_complete() {
        println!(
            "{} Index could not be fully saved to {}; it will not survive a restart",
            "!".yellow(),
            ctx.data_dir.display()
        );
    }

    Ok(())
}
