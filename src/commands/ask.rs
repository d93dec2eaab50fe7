// SPDX-License-Identifier: MIT OR Apache-2.0

//! Answer a question from the index

use anyhow::Result;
use docqa::answer::AnswerStrategy;
use docqa::output::{
    colorize_answer, colorize_context, colorize_label, colorize_source, preview, print_json,
    use_colors,
};

use super::CommandContext;

const CONTEXT_PREVIEW_CHARS: usize = 160;

/// Run the ask command
pub fn run(
    ctx: &CommandContext,
    question: &str,
    strategy: Option<AnswerStrategy>,
    top_k: Option<usize>,
) -> Result<()> {
    let strategy = ctx.config.merge_strategy(strategy);
    let top_k = ctx.config.merge_top_k(top_k);
    let pipeline = ctx.open_pipeline()?;

    let response = pipeline.ask(question, strategy, top_k)?;

    if ctx.is_json() {
        return print_json(&response, ctx.compact);
    }

    let color = use_colors();
    println!(
        "{} {}",
        colorize_label("Answer:", color),
        colorize_answer(&response.answer, color)
    );
    if !response.contexts.is_empty() {
        println!("\n{}", colorize_label("Contexts:", color));
        for (i, (context, source)) in response
            .contexts
            .iter()
            .zip(&response.sources)
            .enumerate()
        {
            println!("  [{}] {}", i + 1, colorize_source(source, color));
            println!(
                "      {}",
                colorize_context(&preview(context, CONTEXT_PREVIEW_CHARS), color)
            );
        }
    }

    Ok(())
}
