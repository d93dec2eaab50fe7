// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller-facing operations: index a batch of documents, ask a question.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::answer::{AnswerStrategy, AnswerSynthesizer};
use crate::config::Config;
use crate::embedding::{build_provider, EmbeddingChunker};
use crate::ingest::ExtractorRegistry;
use crate::retriever::{Retriever, RetrieverPaths, RetrieverStats, SaveOutcome, SearchHit};

/// Chunks contributed by one ingested file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: String,
    pub chunks: usize,
}

/// A file that could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub files: Vec<FileReport>,
    pub skipped: Vec<SkippedFile>,
    pub total_chunks: usize,
    /// Entries in the index after ingestion
    pub index_size: usize,
    pub reset: bool,
    pub saved: SaveOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResponse {
    pub question: String,
    pub answer: String,
    pub strategy: AnswerStrategy,
    pub contexts: Vec<String>,
    pub sources: Vec<String>,
}

/// Retriever plus the ingestion and answering collaborators around it.
pub struct QaPipeline {
    retriever: Retriever,
    chunker: EmbeddingChunker,
    extractors: ExtractorRegistry,
    synthesizer: Mutex<AnswerSynthesizer>,
}

impl QaPipeline {
    pub fn new(
        retriever: Retriever,
        chunker: EmbeddingChunker,
        extractors: ExtractorRegistry,
        synthesizer: AnswerSynthesizer,
    ) -> Self {
        Self {
            retriever,
            chunker,
            extractors,
            synthesizer: Mutex::new(synthesizer),
        }
    }

    /// Builds the full pipeline from configuration, storing the index under
    /// `data_dir`.
    pub fn from_config(config: &Config, data_dir: &Path) -> Result<Self> {
        let chunk_config = config.chunking().chunk_config()?;
        let provider =
            build_provider(config.embeddings()).context("Failed to set up embedding provider")?;
        let paths = RetrieverPaths::in_dir(
            data_dir,
            config.index().index_file(),
            config.index().metadata_file(),
        );
        let retriever = Retriever::open(paths, provider)?;

        Ok(Self::new(
            retriever,
            EmbeddingChunker::new(chunk_config),
            ExtractorRegistry::with_defaults(),
            AnswerSynthesizer::from_config(config.answer()),
        ))
    }

    /// Indexes `paths` and saves once at the end. With `reset_first`, the
    /// existing index and its files are discarded beforehand.
    pub fn ingest_files(&self, paths: &[PathBuf], reset_first: bool) -> Result<IngestReport> {
        self.ingest_files_with_progress(paths, reset_first, |_, _| {})
    }

    /// Like [`QaPipeline::ingest_files`], calling `on_file` with each file's
    /// path and chunk count once its chunks are in the index.
    pub fn ingest_files_with_progress(
        &self,
        paths: &[PathBuf],
        reset_first: bool,
        mut on_file: impl FnMut(&Path, usize),
    ) -> Result<IngestReport> {
        if reset_first {
            self.retriever.reset(true);
        }

        let extractors = &self.extractors;
        let chunker = &self.chunker;
        let parsed: Vec<(&PathBuf, Result<Vec<String>>)> = paths
            .par_iter()
            .map(|path| (path, extractors.parse_and_chunk(path, chunker)))
            .collect();

        let mut files = Vec::new();
        let mut skipped = Vec::new();
        let mut total_chunks = 0;

        for (path, result) in parsed {
            let source = path.display().to_string();
            let chunks = match result {
                Ok(chunks) => chunks,
                Err(err) => {
                    tracing::warn!("Skipping {}: {:#}", source, err);
                    skipped.push(SkippedFile {
                        path: source,
                        reason: format!("{:#}", err),
                    });
                    continue;
                }
            };

            let sources = vec![source.clone(); chunks.len()];
            let added = self
                .retriever
                .add_documents(&chunks, &sources)
                .with_context(|| format!("Failed to index {}", source))?;
            total_chunks += added;
            on_file(path, added);
            files.push(FileReport {
                path: source,
                chunks: added,
            });
        }

        let saved = self.retriever.save();
        tracing::info!(
            "Indexed {} chunks from {} files ({} skipped)",
            total_chunks,
            files.len(),
            skipped.len()
        );

        Ok(IngestReport {
            files,
            skipped,
            total_chunks,
            index_size: self.retriever.len(),
            reset: reset_first,
            saved,
        })
    }

    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        self.retriever.search(query, top_k)
    }

    /// Retrieves `top_k` contexts for `question` and answers from them.
    pub fn ask(
        &self,
        question: &str,
        strategy: AnswerStrategy,
        top_k: usize,
    ) -> Result<AnswerResponse> {
        let hits = self.retriever.search(question, top_k)?;
        let (contexts, sources): (Vec<String>, Vec<String>) =
            hits.into_iter().map(|hit| (hit.text, hit.source)).unzip();

        let answer = self
            .synthesizer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .answer(strategy, question, &contexts)?;

        Ok(AnswerResponse {
            question: question.to_string(),
            answer,
            strategy,
            contexts,
            sources,
        })
    }

    pub fn reset(&self, remove_persisted: bool) {
        self.retriever.reset(remove_persisted);
    }

    pub fn stats(&self) -> RetrieverStats {
        self.retriever.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{ExtractedSpan, ExtractiveModel, GenerativeModel, NOT_RELEVANT_ANSWER};
    use crate::embedding::{ChunkConfig, HashProvider};
    use std::fs;
    use tempfile::TempDir;

    /// Answers with the first context line, or nothing.
    struct FirstLineGenerator;

    impl GenerativeModel for FirstLineGenerator {
        fn generate(&mut self, prompt: &str) -> Result<String> {
            let context = prompt
                .split("Context:\n")
                .nth(1)
                .and_then(|rest| rest.lines().next())
                .unwrap_or_default();
            Ok(context.to_string())
        }
    }

    struct EchoExtractor;

    impl ExtractiveModel for EchoExtractor {
        fn extract(&mut self, _question: &str, context: &str) -> Result<ExtractedSpan> {
            Ok(ExtractedSpan {
                text: context.to_string(),
                score: 0.9,
            })
        }
    }

    fn pipeline(dir: &TempDir) -> QaPipeline {
        let paths = RetrieverPaths::in_dir(&dir.path().join(".docqa"), "vectors.idx", "index_meta.json");
        let retriever = Retriever::open(paths, Box::new(HashProvider::new(128))).unwrap();
        QaPipeline::new(
            retriever,
            EmbeddingChunker::new(ChunkConfig::new(200, 20).unwrap()),
            ExtractorRegistry::with_defaults(),
            AnswerSynthesizer::new()
                .with_generative(Box::new(FirstLineGenerator))
                .with_extractive(Box::new(EchoExtractor)),
        )
    }

    fn write_docs(dir: &TempDir) -> Vec<PathBuf> {
        let paris = dir.path().join("paris.txt");
        let plants = dir.path().join("plants.txt");
        fs::write(&paris, "Paris is the capital of France").unwrap();
        fs::write(&plants, "Photosynthesis turns light into sugar").unwrap();
        vec![paris, plants]
    }

    #[test]
    fn test_ingest_and_ask() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let docs = write_docs(&dir);

        let report = pipeline.ingest_files(&docs, true).unwrap();
        assert_eq!(report.total_chunks, 2);
        assert_eq!(report.index_size, 2);
        assert!(report.saved.is_complete());

        let response = pipeline
            .ask("what is the capital of France", AnswerStrategy::Generative, 1)
            .unwrap();
        assert_eq!(response.answer, "Paris is the capital of France");
        assert_eq!(response.sources, vec![docs[0].display().to_string()]);
        assert_eq!(response.contexts.len(), 1);
    }

    #[test]
    fn test_reset_first_replaces_previous_documents() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let docs = write_docs(&dir);

        pipeline.ingest_files(&docs, true).unwrap();
        let report = pipeline.ingest_files(&docs[..1], true).unwrap();
        assert_eq!(report.index_size, 1);

        let appended = pipeline.ingest_files(&docs[1..], false).unwrap();
        assert_eq!(appended.index_size, 2);
        assert!(!appended.reset);
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let mut docs = write_docs(&dir);
        docs.push(dir.path().join("missing.txt"));

        let report = pipeline.ingest_files(&docs, true).unwrap();
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("missing.txt"));
    }

    #[test]
    fn test_progress_callback_sees_each_file() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let docs = write_docs(&dir);

        let mut seen = Vec::new();
        pipeline
            .ingest_files_with_progress(&docs, true, |path, chunks| {
                seen.push((path.to_path_buf(), chunks))
            })
            .unwrap();
        assert_eq!(seen, vec![(docs[0].clone(), 1), (docs[1].clone(), 1)]);
    }

    #[test]
    fn test_ask_on_empty_index_uses_sentinel() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);

        let response = pipeline
            .ask("anything", AnswerStrategy::Generative, 3)
            .unwrap();
        assert!(response.contexts.is_empty());
        assert_eq!(response.answer, NOT_RELEVANT_ANSWER);
    }

    #[test]
    fn test_extractive_strategy() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let docs = write_docs(&dir);
        pipeline.ingest_files(&docs, true).unwrap();

        let response = pipeline
            .ask("photosynthesis light", AnswerStrategy::Extractive, 1)
            .unwrap();
        assert_eq!(response.answer, "Photosynthesis turns light into sugar");
        assert_eq!(response.strategy, AnswerStrategy::Extractive);
    }

    #[test]
    fn test_index_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let docs = write_docs(&dir);
        pipeline(&dir).ingest_files(&docs, true).unwrap();

        let reopened = pipeline(&dir);
        assert_eq!(reopened.stats().entries, 2);
        assert!(reopened.stats().restored);
    }
}
