// SPDX-License-Identifier: MIT OR Apache-2.0

//! Show the chunks nearest to a query

use anyhow::Result;
use colored::Colorize;
use docqa::output::{colorize_context, colorize_score, colorize_source, preview, print_json, use_colors};

use super::CommandContext;

const PREVIEW_CHARS: usize = 200;

/// Run the search command
pub fn run(ctx: &CommandContext, query: &str, top_k: Option<usize>) -> Result<()> {
    let top_k = ctx.config.merge_top_k(top_k);
    let pipeline = ctx.open_pipeline()?;
    let hits = pipeline.search(query, top_k)?;

    if ctx.is_json() {
        return print_json(&hits, ctx.compact);
    }

    if hits.is_empty() {
        println!("{} No results for: {}", "✗".red(), query.yellow());
        return Ok(());
    }

    let color = use_colors();
    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{}. {} (distance {})",
            i + 1,
            colorize_source(&hit.source, color),
            colorize_score(hit.score, color)
        );
        println!("   {}", colorize_context(&preview(&hit.text, PREVIEW_CHARS), color));
    }

    Ok(())
}
