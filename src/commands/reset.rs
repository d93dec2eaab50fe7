// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clear the index without loading an embedding model

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use super::CommandContext;
use docqa::output::print_json;
use docqa::retriever::{remove_persisted, write_empty};

#[derive(Debug, Serialize)]
struct ResetResult {
    data_dir: String,
    files_removed: bool,
    saved: bool,
}

/// Run the reset command
pub fn run(ctx: &CommandContext, keep_files: bool) -> Result<()> {
    let paths = ctx.paths();
    let saved = if keep_files {
        let dimension = ctx.config.embeddings().provider_dimension();
        write_empty(&paths, dimension).is_complete()
    } else {
        remove_persisted(&paths);
        false
    };

    let result = ResetResult {
        data_dir: ctx.data_dir.display().to_string(),
        files_removed: !keep_files,
        saved,
    };

    if ctx.is_json() {
        return print_json(&result, ctx.compact);
    }

    if keep_files && !saved {
        println!("{} Index cleared but could not be saved", "!".yellow());
    } else {
        println!("{} Index cleared ({})", "✓".green(), result.data_dir);
    }
    Ok(())
}
