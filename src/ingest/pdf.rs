// SPDX-License-Identifier: MIT OR Apache-2.0

//! PDF text extraction using lopdf.

use anyhow::{anyhow, bail, Context, Result};
use lopdf::Document;
use std::path::Path;

use super::Extractor;

/// Extracts the text layer of every page, in page order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let doc = Document::load(path)
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("Failed to open PDF {}", path.display()))?;

        let pages = doc.get_pages();
        if pages.is_empty() {
            bail!("PDF {} has no pages", path.display());
        }

        let mut text = String::new();
        for page_number in pages.into_keys() {
            match doc.extract_text(&[page_number]) {
                Ok(page_text) => text.push_str(&page_text),
                Err(err) => {
                    tracing::debug!(
                        "{}: no text on page {}: {}",
                        path.display(),
                        page_number,
                        err
                    );
                }
            }
        }

        if text.trim().is_empty() {
            tracing::warn!("{}: PDF has no extractable text", path.display());
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use std::fs;
    use tempfile::TempDir;

    fn write_pdf(path: &Path, lines: &[&str]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
        ];
        for line in lines {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        }
        operations.push(Operation::new("ET", vec![]));
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_extracts_page_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("capital.pdf");
        write_pdf(&path, &["Paris is the capital of France."]);

        let text = PdfExtractor.extract(&path).unwrap();
        assert!(text.contains("Paris is the capital of France."));
        assert!(!text.contains("%PDF"));
    }

    #[test]
    fn test_malformed_pdf_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\nstream\nx\x9c\x00\x01endstream\n").unwrap();

        assert!(PdfExtractor.extract(&path).is_err());
    }
}
