// SPDX-License-Identifier: MIT OR Apache-2.0

//! docqa - Local document question answering
//!
//! Indexes documents into an exact nearest-neighbor vector index and answers
//! questions from the retrieved chunks.

mod cli;
mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands};
use commands::CommandContext;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize tracing with DOCQA_LOG env var (e.g., DOCQA_LOG=debug docqa ask "question")
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("DOCQA_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = CommandContext::load(cli.format, cli.compact, cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Index { paths, append } => {
            commands::index::run(&ctx, &paths, append)?;
        }
        Commands::Ask {
            question,
            strategy,
            top_k,
        } => {
            commands::ask::run(&ctx, &question, strategy, top_k)?;
        }
        Commands::Search { query, top_k } => {
            commands::search::run(&ctx, &query, top_k)?;
        }
        Commands::Reset { keep_files } => {
            commands::reset::run(&ctx, keep_files)?;
        }
        Commands::Status => {
            commands::status::run(&ctx)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "docqa", &mut std::io::stdout());
        }
    }

    Ok(())
}
