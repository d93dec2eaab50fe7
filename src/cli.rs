// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use docqa::answer::AnswerStrategy;
use std::path::PathBuf;

/// docqa - Local document question answering
///
/// Indexes documents into a local vector index and answers questions from
/// the most relevant chunks.
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Compact JSON output (no pretty formatting)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Directory holding the persisted index (defaults to the nearest .docqa)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index files and directories, replacing the current index
    Index {
        /// Files or directories to index
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Add to the existing index instead of replacing it
        #[arg(long)]
        append: bool,
    },

    /// Answer a question from the indexed documents
    Ask {
        /// The question to answer
        question: String,

        /// Answer strategy (generative or extractive)
        #[arg(short, long, value_enum)]
        strategy: Option<AnswerStrategy>,

        /// Number of chunks used as context
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Show the chunks closest to a query
    Search {
        /// Search query
        query: String,

        /// Number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Clear the index
    Reset {
        /// Write an empty index instead of deleting the files
        #[arg(long)]
        keep_files: bool,
    },

    /// Show what is stored in the index
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
