// SPDX-License-Identifier: MIT OR Apache-2.0

//! Comma- and tab-separated tables.
//!
//! When the header names question/answer columns, each row becomes its
//! non-empty Q/A cells joined by ` -- `, so a FAQ sheet indexes as Q/A pairs.
//! Otherwise each row becomes its cells joined by spaces. One row per line.

use anyhow::Result;
use std::path::Path;

use super::{Extractor, TextExtractor};

const QA_COLUMNS: &[&str] = &["q", "question", "a", "answer"];
const QA_SEPARATOR: &str = " -- ";

#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedExtractor;

impl Extractor for DelimitedExtractor {
    fn extensions(&self) -> &[&'static str] {
        &["csv", "tsv"]
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let content = TextExtractor.extract(path)?;
        let is_tsv = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("tsv"))
            .unwrap_or(false);
        let delimiter = if is_tsv { '\t' } else { ',' };
        Ok(flatten_table(&parse_records(&content, delimiter)))
    }
}

/// Renders parsed records (header first) as one line of text per data row.
pub fn flatten_table(records: &[Vec<String>]) -> String {
    let Some((header, rows)) = records.split_first() else {
        return String::new();
    };

    let key_columns: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, name)| QA_COLUMNS.contains(&name.trim().to_lowercase().as_str()))
        .map(|(idx, _)| idx)
        .collect();

    let lines: Vec<String> = if key_columns.is_empty() {
        rows.iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|row| row.join(" "))
            .collect()
    } else {
        rows.iter()
            .filter_map(|row| {
                let pieces: Vec<&str> = key_columns
                    .iter()
                    .filter_map(|&idx| row.get(idx))
                    .map(|cell| cell.trim())
                    .filter(|cell| !cell.is_empty())
                    .collect();
                (!pieces.is_empty()).then(|| pieces.join(QA_SEPARATOR))
            })
            .collect()
    };

    lines.join("\n")
}

/// Splits delimited text into records. Double-quoted fields may contain the
/// delimiter, newlines and `""` escapes. Blank lines are dropped.
pub fn parse_records(content: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
            }
            c if c == delimiter => record.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }

    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].is_empty();
    if !blank {
        records.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn table(content: &str) -> String {
        flatten_table(&parse_records(content, ','))
    }

    #[test]
    fn test_qa_columns_keep_every_row() {
        let text = table("Question,Answer,Owner\nWhat is Rust?,A language,me\nWhy?,Speed,you\n");
        assert_eq!(text, "What is Rust? -- A language\nWhy? -- Speed");
    }

    #[test]
    fn test_short_qa_headers() {
        let text = table("id,q,a\n1,Capital of France?,Paris\n");
        assert_eq!(text, "Capital of France? -- Paris");
    }

    #[test]
    fn test_qa_row_with_empty_cell() {
        let text = table("question,answer\nOrphan question,\n,\n");
        assert_eq!(text, "Orphan question");
    }

    #[test]
    fn test_plain_table_joins_cells() {
        let text = table("city,country\nParis,France\nRome,Italy\n");
        assert_eq!(text, "Paris France\nRome Italy");
    }

    #[test]
    fn test_quoted_fields() {
        let records = parse_records("a,b\n\"x, y\",\"say \"\"hi\"\"\"\n", ',');
        assert_eq!(records[1], vec!["x, y".to_string(), "say \"hi\"".to_string()]);
    }

    #[test]
    fn test_quoted_newline_and_crlf() {
        let records = parse_records("a,b\r\n\"line1\nline2\",z\r\n\r\n", ',');
        assert_eq!(records.len(), 2);
        assert_eq!(records[1][0], "line1\nline2");
        assert_eq!(records[1][1], "z");
    }

    #[test]
    fn test_missing_trailing_newline() {
        let records = parse_records("a,b\n1,2", ',');
        assert_eq!(records, vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn test_header_only() {
        assert_eq!(table("question,answer\n"), "");
        assert_eq!(table(""), "");
    }

    #[test]
    fn test_tsv_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("faq.tsv");
        fs::write(&path, "q\ta\nHow, exactly?\tCarefully\n").unwrap();

        let text = DelimitedExtractor.extract(&path).unwrap();
        assert_eq!(text, "How, exactly? -- Carefully");
    }
}
