// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document ingestion: text extraction by file extension, then chunking.
//!
//! Extraction is pluggable through [`Extractor`]; anything the registry does
//! not recognise is read as plain text unless it looks binary.

pub mod delimited;
pub mod pdf;
pub mod scanner;

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::embedding::EmbeddingChunker;

pub use delimited::DelimitedExtractor;
pub use pdf::PdfExtractor;
pub use scanner::collect_files;

/// Bytes inspected when sniffing for binary content.
const BINARY_SNIFF_LEN: usize = 8192;

/// Turns a document on disk into plain text.
pub trait Extractor: Send + Sync {
    /// Lowercase extensions (without the dot) this extractor handles.
    fn extensions(&self) -> &[&'static str];

    fn extract(&self, path: &Path) -> Result<String>;
}

/// Reads the file as UTF-8, replacing invalid sequences. Content with a NUL
/// byte near the start is treated as binary and rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl Extractor for TextExtractor {
    fn extensions(&self) -> &[&'static str] {
        &["txt", "md", "markdown", "rst", "log", "json", "html", "htm", "xml"]
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        if looks_binary(&bytes) {
            bail!("{} looks like a binary file", path.display());
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Document formats with no extractor here. Rejected outright so their raw
/// bytes never reach the index.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedExtractor;

impl Extractor for UnsupportedExtractor {
    fn extensions(&self) -> &[&'static str] {
        &[
            "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf", "epub",
            "zip", "gz", "tar", "png", "jpg", "jpeg", "gif", "webp",
        ]
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        bail!("unsupported document format '.{}'", ext.to_lowercase())
    }
}

fn looks_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(BINARY_SNIFF_LEN)].contains(&0)
}

/// Extension-keyed set of extractors with a plain-text fallback.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn Extractor>>,
    fallback: TextExtractor,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ExtractorRegistry {
    /// Registry with no extractors; every file goes to the text fallback.
    pub fn empty() -> Self {
        Self {
            extractors: Vec::new(),
            fallback: TextExtractor,
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(UnsupportedExtractor));
        registry.register(Box::new(TextExtractor));
        registry.register(Box::new(DelimitedExtractor));
        registry.register(Box::new(PdfExtractor));
        registry
    }

    /// Adds an extractor. Later registrations win for shared extensions.
    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        self.extractors.push(extractor);
    }

    /// Picks the extractor for `path` by its lowercase extension.
    pub fn extractor_for(&self, path: &Path) -> &dyn Extractor {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        ext.and_then(|ext| {
            self.extractors
                .iter()
                .rev()
                .find(|extractor| extractor.extensions().contains(&ext.as_str()))
        })
        .map(|extractor| &**extractor)
        .unwrap_or(&self.fallback)
    }

    pub fn extract(&self, path: &Path) -> Result<String> {
        self.extractor_for(path).extract(path)
    }

    /// Extracts `path` and splits the text into chunk strings.
    pub fn parse_and_chunk(&self, path: &Path, chunker: &EmbeddingChunker) -> Result<Vec<String>> {
        let content = self.extract(path)?;
        let chunks: Vec<String> = chunker
            .chunk_text(&content)
            .into_iter()
            .map(|chunk| chunk.text)
            .collect();
        tracing::debug!("{}: {} chunks", path.display(), chunks.len());
        Ok(chunks)
    }
}

/// Extracts and chunks `path` with the default extractors.
pub fn parse_and_chunk(path: &Path, chunker: &EmbeddingChunker) -> Result<Vec<String>> {
    ExtractorRegistry::with_defaults().parse_and_chunk(path, chunker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::ChunkConfig;
    use tempfile::TempDir;

    struct UpperExtractor;

    impl Extractor for UpperExtractor {
        fn extensions(&self) -> &[&'static str] {
            &["txt"]
        }

        fn extract(&self, path: &Path) -> Result<String> {
            Ok(fs::read_to_string(path)?.to_uppercase())
        }
    }

    #[test]
    fn test_text_file_chunks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "abcdefghij").unwrap();

        let chunker = EmbeddingChunker::new(ChunkConfig::new(4, 1).unwrap());
        let chunks = parse_and_chunk(&path, &chunker).unwrap();
        assert_eq!(chunks, vec!["abcd", "defg", "ghij", "j"]);
    }

    #[test]
    fn test_unknown_extension_falls_back_to_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.weird");
        fs::write(&path, b"plain \xff bytes").unwrap();

        let chunks = parse_and_chunk(&path, &EmbeddingChunker::with_defaults()).unwrap();
        assert_eq!(chunks, vec!["plain \u{FFFD} bytes"]);
    }

    #[test]
    fn test_pdf_bytes_are_never_indexed_raw() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.pdf");
        fs::write(
            &path,
            b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\nstream\nx\x9c\x00\x01endstream\n",
        )
        .unwrap();

        assert!(parse_and_chunk(&path, &EmbeddingChunker::with_defaults()).is_err());
    }

    #[test]
    fn test_office_formats_are_rejected() {
        let dir = TempDir::new().unwrap();
        for name in ["report.docx", "sheet.XLSX"] {
            let path = dir.path().join(name);
            fs::write(&path, b"PK\x03\x04 zipped").unwrap();

            let err = parse_and_chunk(&path, &EmbeddingChunker::with_defaults()).unwrap_err();
            assert!(err.to_string().contains("unsupported document format"));
        }
    }

    #[test]
    fn test_binary_content_with_unknown_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.bin");
        fs::write(&path, b"ELF\x00\x01\x02").unwrap();

        let err = ExtractorRegistry::with_defaults().extract(&path).unwrap_err();
        assert!(err.to_string().contains("binary"));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("TABLE.CSV");
        fs::write(&path, "question,answer\nWhy?,Because\n").unwrap();

        let text = ExtractorRegistry::with_defaults().extract(&path).unwrap();
        assert_eq!(text, "Why? -- Because");
    }

    #[test]
    fn test_later_registration_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "quiet").unwrap();

        let mut registry = ExtractorRegistry::with_defaults();
        registry.register(Box::new(UpperExtractor));
        assert_eq!(registry.extract(&path).unwrap(), "QUIET");
    }

    #[test]
    fn test_empty_file_has_no_chunks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "").unwrap();

        assert!(parse_and_chunk(&path, &EmbeddingChunker::with_defaults())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = parse_and_chunk(&dir.path().join("nope.txt"), &EmbeddingChunker::with_defaults());
        assert!(result.is_err());
    }
}
