// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations

pub mod ask;
pub mod index;
pub mod reset;
pub mod search;
pub mod status;

use anyhow::Result;
use docqa::config::{Config, ConfigOutputFormat};
use docqa::pipeline::QaPipeline;
use docqa::retriever::RetrieverPaths;
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;

/// Settings shared by every subcommand: config, resolved data directory and
/// output format.
pub struct CommandContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub format: OutputFormat,
    pub compact: bool,
}

impl CommandContext {
    /// Loads config and resolves CLI overrides against it.
    pub fn load(format: Option<OutputFormat>, compact: bool, data_dir: Option<&Path>) -> Result<Self> {
        let config = Config::load();
        let format = format.unwrap_or(match config.output_format() {
            Some(ConfigOutputFormat::Json) => OutputFormat::Json,
            _ => OutputFormat::Text,
        });
        let cwd = std::env::current_dir()?;
        let data_dir = config.data_dir(data_dir, &cwd);
        tracing::debug!("Using data directory {}", data_dir.display());

        Ok(Self {
            config,
            data_dir,
            format,
            compact,
        })
    }

    pub fn paths(&self) -> RetrieverPaths {
        RetrieverPaths::in_dir(
            &self.data_dir,
            self.config.index().index_file(),
            self.config.index().metadata_file(),
        )
    }

    pub fn open_pipeline(&self) -> Result<QaPipeline> {
        QaPipeline::from_config(&self.config, &self.data_dir)
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
