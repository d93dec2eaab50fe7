// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for docqa
//!
//! Loads configuration from .docqarc.toml in current directory or ~/.config/docqa/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::answer::{AnswerStrategy, MIN_EXTRACTIVE_CONFIDENCE};
use crate::embedding::chunker::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::embedding::{ChunkConfig, DEFAULT_EMBEDDING_DIM};
use crate::errors::Result;
use crate::utils::DATA_DIR;

/// Output format for results (mirrored from cli for library use)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOutputFormat {
    #[default]
    Text,
    Json,
}

/// Embedding provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    #[default]
    Builtin,
    Command,
    Hash,
    Dummy,
}

/// Index location configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Data directory holding the persisted index
    pub data_dir: Option<PathBuf>,
    /// File name of the vector index inside the data directory
    pub index_file: Option<String>,
    /// File name of the metadata JSON inside the data directory
    pub metadata_file: Option<String>,
}

impl IndexConfig {
    /// Get data directory, if one is configured
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Get index file name (defaults to "vectors.idx")
    pub fn index_file(&self) -> &str {
        self.index_file.as_deref().unwrap_or("vectors.idx")
    }

    /// Get metadata file name (defaults to "index_meta.json")
    pub fn metadata_file(&self) -> &str {
        self.metadata_file.as_deref().unwrap_or("index_meta.json")
    }
}

/// Chunking configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Number of characters per chunk
    pub chunk_size: Option<usize>,
    /// Number of overlapping characters between chunks
    pub overlap: Option<usize>,
}

impl ChunkingConfig {
    /// Get chunk size (defaults to 800)
    pub fn chunk_size(&self) -> usize {
        self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    /// Get overlap (defaults to 100)
    pub fn overlap(&self) -> usize {
        self.overlap.unwrap_or(DEFAULT_CHUNK_OVERLAP)
    }

    /// Validated chunker settings
    pub fn chunk_config(&self) -> Result<ChunkConfig> {
        ChunkConfig::new(self.chunk_size(), self.overlap())
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider type (builtin, command, hash, dummy)
    pub provider: Option<EmbeddingProviderType>,
    /// Model identifier for the command provider
    pub model: Option<String>,
    /// Command to execute for command provider
    pub command: Option<String>,
    /// Embedding dimension for command, hash and dummy providers
    pub dimension: Option<usize>,
    /// Number of texts embedded per batch
    pub batch_size: Option<usize>,
}

impl EmbeddingConfig {
    /// Get provider type (defaults to Builtin)
    pub fn provider(&self) -> EmbeddingProviderType {
        self.provider.unwrap_or_default()
    }

    /// Get model identifier (defaults to "all-MiniLM-L6-v2")
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or("all-MiniLM-L6-v2")
    }

    /// Get command (defaults to "embedder")
    pub fn command(&self) -> &str {
        self.command.as_deref().unwrap_or("embedder")
    }

    /// Get dimension (defaults to 384)
    pub fn dimension(&self) -> usize {
        self.dimension.unwrap_or(DEFAULT_EMBEDDING_DIM)
    }

    /// Dimension the configured provider produces, known without loading it.
    /// The builtin model ignores `dimension`.
    pub fn provider_dimension(&self) -> usize {
        match self.provider() {
            EmbeddingProviderType::Builtin => DEFAULT_EMBEDDING_DIM,
            _ => self.dimension(),
        }
    }
}

/// Answer configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnswerConfig {
    /// Default answer strategy (generative, extractive)
    pub strategy: Option<AnswerStrategy>,
    /// Number of contexts retrieved per question
    pub top_k: Option<usize>,
    /// Extractive spans scoring below this are treated as unknown
    pub min_confidence: Option<f32>,
    /// Command driving the generative model
    pub generative_command: Option<String>,
    /// Command driving the extractive model
    pub extractive_command: Option<String>,
}

impl AnswerConfig {
    /// Get strategy (defaults to Generative)
    pub fn strategy(&self) -> AnswerStrategy {
        self.strategy.unwrap_or_default()
    }

    /// Get top k (defaults to 3)
    pub fn top_k(&self) -> usize {
        self.top_k.unwrap_or(3)
    }

    /// Get minimum extractive confidence (defaults to 0.1)
    pub fn min_confidence(&self) -> f32 {
        self.min_confidence.unwrap_or(MIN_EXTRACTIVE_CONFIDENCE)
    }

    pub fn generative_command(&self) -> Option<&str> {
        self.generative_command.as_deref()
    }

    pub fn extractive_command(&self) -> Option<&str> {
        self.extractive_command.as_deref()
    }
}

/// Configuration loaded from .docqarc.toml or ~/.config/docqa/config.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output format (text or json)
    pub default_format: Option<String>,

    /// Index configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,

    /// Answer configuration
    #[serde(default)]
    pub answer: AnswerConfig,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .docqarc.toml in current directory
    /// 2. ~/.config/docqa/config.toml
    pub fn load() -> Self {
        // Try current directory first
        if let Some(config) = Self::load_from_path(Path::new(".docqarc.toml")) {
            return config;
        }

        // Try home directory config
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("docqa").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    /// Reads one config file; a missing file is `None`, a malformed one is
    /// warned about and skipped.
    pub fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!("Loaded config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Get output format from config, parsing the string to ConfigOutputFormat
    pub fn output_format(&self) -> Option<ConfigOutputFormat> {
        self.default_format
            .as_ref()
            .and_then(|s| match s.to_lowercase().as_str() {
                "json" => Some(ConfigOutputFormat::Json),
                "text" => Some(ConfigOutputFormat::Text),
                _ => None,
            })
    }

    /// Merge CLI top k with config (CLI wins)
    pub fn merge_top_k(&self, cli_value: Option<usize>) -> usize {
        cli_value.unwrap_or_else(|| self.answer.top_k())
    }

    /// Merge CLI strategy with config (CLI wins)
    pub fn merge_strategy(&self, cli_value: Option<AnswerStrategy>) -> AnswerStrategy {
        cli_value.unwrap_or_else(|| self.answer.strategy())
    }

    /// Resolves the data directory: explicit override, then config, then the
    /// nearest `.docqa` walking up from `cwd` (falling back to `cwd/.docqa`).
    pub fn data_dir(&self, cli_value: Option<&Path>, cwd: &Path) -> PathBuf {
        if let Some(dir) = cli_value.or_else(|| self.index.data_dir()) {
            return if dir.is_absolute() {
                dir.to_path_buf()
            } else {
                cwd.join(dir)
            };
        }
        crate::utils::get_data_path(cwd, DATA_DIR)
    }

    /// Get the index configuration
    pub fn index(&self) -> &IndexConfig {
        &self.index
    }

    /// Get the chunking configuration
    pub fn chunking(&self) -> &ChunkingConfig {
        &self.chunking
    }

    /// Get the embedding configuration
    pub fn embeddings(&self) -> &EmbeddingConfig {
        &self.embeddings
    }

    /// Get the answer configuration
    pub fn answer(&self) -> &AnswerConfig {
        &self.answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.index().index_file(), "vectors.idx");
        assert_eq!(config.index().metadata_file(), "index_meta.json");
        assert_eq!(config.chunking().chunk_size(), 800);
        assert_eq!(config.chunking().overlap(), 100);
        assert_eq!(config.embeddings().provider(), EmbeddingProviderType::Builtin);
        assert_eq!(config.embeddings().dimension(), 384);
        assert_eq!(config.embeddings().provider_dimension(), 384);
        assert_eq!(config.answer().strategy(), AnswerStrategy::Generative);
        assert_eq!(config.answer().top_k(), 3);
        assert!((config.answer().min_confidence() - 0.1).abs() < f32::EPSILON);
        assert!(config.answer().generative_command().is_none());
    }

    #[test]
    fn test_parse_full_file() {
        let config: Config = toml::from_str(
            r#"
default_format = "json"

[index]
data_dir = "store"
index_file = "faiss.idx"

[chunking]
chunk_size = 400
overlap = 50

[embeddings]
provider = "hash"
dimension = 64

[answer]
strategy = "extractive"
top_k = 5
min_confidence = 0.25
extractive_command = "reader"
"#,
        )
        .unwrap();

        assert_eq!(config.output_format(), Some(ConfigOutputFormat::Json));
        assert_eq!(config.index().data_dir(), Some(Path::new("store")));
        assert_eq!(config.index().index_file(), "faiss.idx");
        assert_eq!(config.index().metadata_file(), "index_meta.json");
        assert_eq!(config.chunking().chunk_config().unwrap().step(), 350);
        assert_eq!(config.embeddings().provider(), EmbeddingProviderType::Hash);
        assert_eq!(config.embeddings().dimension(), 64);
        assert_eq!(config.embeddings().provider_dimension(), 64);
        assert_eq!(config.answer().strategy(), AnswerStrategy::Extractive);
        assert_eq!(config.answer().top_k(), 5);
        assert_eq!(config.answer().extractive_command(), Some("reader"));
    }

    #[test]
    fn test_invalid_chunking_is_rejected() {
        let config: Config = toml::from_str("[chunking]\nchunk_size = 100\noverlap = 100\n").unwrap();
        assert!(config.chunking().chunk_config().is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let config: Config = toml::from_str("[answer]\ntop_k = 7\nstrategy = \"extractive\"\n").unwrap();
        assert_eq!(config.merge_top_k(None), 7);
        assert_eq!(config.merge_top_k(Some(2)), 2);
        assert_eq!(config.merge_strategy(None), AnswerStrategy::Extractive);
        assert_eq!(
            config.merge_strategy(Some(AnswerStrategy::Generative)),
            AnswerStrategy::Generative
        );
    }

    #[test]
    fn test_data_dir_resolution() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();

        assert_eq!(config.data_dir(None, dir.path()), dir.path().join(".docqa"));
        assert_eq!(
            config.data_dir(Some(Path::new("custom")), dir.path()),
            dir.path().join("custom")
        );

        let configured: Config = toml::from_str("[index]\ndata_dir = \"/var/docqa\"\n").unwrap();
        assert_eq!(
            configured.data_dir(None, dir.path()),
            PathBuf::from("/var/docqa")
        );
    }

    #[test]
    fn test_malformed_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".docqarc.toml");
        fs::write(&path, "[answer\ntop_k = ").unwrap();
        assert!(Config::load_from_path(&path).is_none());
        assert!(Config::load_from_path(&dir.path().join("missing.toml")).is_none());
    }
}
