// SPDX-License-Identifier: MIT OR Apache-2.0

//! Answer models driven through external commands.
//!
//! Each command is run with `sh -c`, receives one JSON object on stdin and
//! prints one JSON value on stdout.

use anyhow::{bail, Result};
use serde_json::Value;

use super::{ExtractedSpan, ExtractiveModel, GenerativeModel};
use crate::utils::run_json_command;

/// Generative model behind a command.
///
/// Input: `{"prompt": "..."}`. Output: a JSON string, or an object with the
/// text under `answer`, `generated_text` or `text`.
pub struct CommandGenerator {
    command: String,
}

impl CommandGenerator {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl GenerativeModel for CommandGenerator {
    fn generate(&mut self, prompt: &str) -> Result<String> {
        let payload = serde_json::json!({ "prompt": prompt });
        let output = run_json_command(&self.command, &payload)?;
        match output {
            Value::String(text) => Ok(text),
            Value::Object(obj) => {
                for key in ["answer", "generated_text", "text"] {
                    if let Some(text) = obj.get(key).and_then(Value::as_str) {
                        return Ok(text.to_string());
                    }
                }
                bail!("Generator output missing 'answer' field")
            }
            _ => bail!("Generator output must be a JSON string or object"),
        }
    }
}

/// Extractive model behind a command.
///
/// Input: `{"question": "...", "context": "..."}`. Output:
/// `{"answer": "...", "score": 0.93}`; a missing score counts as 0.
pub struct CommandExtractor {
    command: String,
}

impl CommandExtractor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl ExtractiveModel for CommandExtractor {
    fn extract(&mut self, question: &str, context: &str) -> Result<ExtractedSpan> {
        let payload = serde_json::json!({
            "question": question,
            "context": context,
        });
        let output = run_json_command(&self.command, &payload)?;
        let Value::Object(obj) = output else {
            bail!("Extractor output must be a JSON object");
        };

        let text = obj
            .get("answer")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let score = obj.get("score").and_then(Value::as_f64).unwrap_or(0.0) as f32;

        Ok(ExtractedSpan { text, score })
    }
}
