// SPDX-License-Identifier: MIT OR Apache-2.0

//! Answer synthesis from retrieved contexts.
//!
//! Two strategies are supported. The generative one prompts a text model to
//! answer only from the supplied context; the extractive one asks a reading
//! model for a span of the context plus a confidence score. Both normalize
//! uncertain output to a fixed sentinel answer.

pub mod command;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::AnswerConfig;
use crate::errors::RetrievalError;

pub use command::{CommandExtractor, CommandGenerator};

/// Returned by the generative strategy when the context does not answer.
pub const NOT_RELEVANT_ANSWER: &str = "not relevant to the context";

/// Returned by the extractive strategy for empty or low-confidence spans.
pub const LOW_CONFIDENCE_ANSWER: &str = "I don\u{2019}t know, but I can help search for more info.";

/// Spans scoring below this are replaced by [`LOW_CONFIDENCE_ANSWER`].
pub const MIN_EXTRACTIVE_CONFIDENCE: f32 = 0.1;

/// Answer strategy, chosen per request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStrategy {
    /// Free-form answer from a text-to-text model
    #[default]
    #[serde(alias = "google/flan-t5-small")]
    #[value(alias = "google/flan-t5-small")]
    Generative,
    /// Span extracted from the context by a reading model
    #[serde(alias = "deepset/tinyroberta-squad2")]
    #[value(alias = "deepset/tinyroberta-squad2")]
    Extractive,
}

impl AnswerStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerStrategy::Generative => "generative",
            AnswerStrategy::Extractive => "extractive",
        }
    }
}

impl fmt::Display for AnswerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Span picked by an extractive model, with its confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSpan {
    pub text: String,
    pub score: f32,
}

/// Text-to-text model used by the generative strategy.
pub trait GenerativeModel: Send {
    fn generate(&mut self, prompt: &str) -> Result<String>;
}

/// Reading-comprehension model used by the extractive strategy.
pub trait ExtractiveModel: Send {
    fn extract(&mut self, question: &str, context: &str) -> Result<ExtractedSpan>;
}

/// Builds the grounded prompt sent to the generative model.
pub fn build_prompt(question: &str, contexts: &[String]) -> String {
    format!(
        "You are a helpful and precise AI assistant.\n\
         Answer ONLY based on the context below.\n\
         If the answer is not in the context, respond with: \"{}\".\n\
         \n\
         Context:\n\
         {}\n\
         \n\
         Question: {}\n",
        NOT_RELEVANT_ANSWER,
        contexts.join("\n\n"),
        question
    )
}

/// Maps empty or uncertain generated text to [`NOT_RELEVANT_ANSWER`].
pub fn normalize_generated(output: &str) -> String {
    let answer = output.trim();
    let lowered = answer.to_lowercase();
    if answer.is_empty() || lowered.contains("not relevant") || lowered.contains("i don't know") {
        NOT_RELEVANT_ANSWER.to_string()
    } else {
        answer.to_string()
    }
}

/// Maps an empty span, or one scoring below `min_confidence`, to
/// [`LOW_CONFIDENCE_ANSWER`].
pub fn normalize_extracted(span: &ExtractedSpan, min_confidence: f32) -> String {
    let answer = span.text.trim();
    if answer.is_empty() || span.score < min_confidence {
        LOW_CONFIDENCE_ANSWER.to_string()
    } else {
        answer.to_string()
    }
}

/// Dispatches a question to the model behind the requested strategy.
pub struct AnswerSynthesizer {
    generative: Option<Box<dyn GenerativeModel>>,
    extractive: Option<Box<dyn ExtractiveModel>>,
    min_confidence: f32,
}

impl Default for AnswerSynthesizer {
    fn default() -> Self {
        Self {
            generative: None,
            extractive: None,
            min_confidence: MIN_EXTRACTIVE_CONFIDENCE,
        }
    }
}

impl AnswerSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires up command-driven models for each strategy that has a command
    /// configured.
    pub fn from_config(config: &AnswerConfig) -> Self {
        let mut synthesizer = Self::new().with_min_confidence(config.min_confidence());
        if let Some(command) = config.generative_command() {
            synthesizer = synthesizer.with_generative(Box::new(CommandGenerator::new(command)));
        }
        if let Some(command) = config.extractive_command() {
            synthesizer = synthesizer.with_extractive(Box::new(CommandExtractor::new(command)));
        }
        synthesizer
    }

    pub fn with_generative(mut self, model: Box<dyn GenerativeModel>) -> Self {
        self.generative = Some(model);
        self
    }

    pub fn with_extractive(mut self, model: Box<dyn ExtractiveModel>) -> Self {
        self.extractive = Some(model);
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Whether a model is configured for `strategy`.
    pub fn supports(&self, strategy: AnswerStrategy) -> bool {
        match strategy {
            AnswerStrategy::Generative => self.generative.is_some(),
            AnswerStrategy::Extractive => self.extractive.is_some(),
        }
    }

    /// Answers `question` from `contexts` with the given strategy.
    pub fn answer(
        &mut self,
        strategy: AnswerStrategy,
        question: &str,
        contexts: &[String],
    ) -> Result<String> {
        match strategy {
            AnswerStrategy::Generative => {
                let model = self
                    .generative
                    .as_mut()
                    .ok_or(RetrievalError::ModelNotConfigured(strategy))?;
                let prompt = build_prompt(question, contexts);
                let output = model
                    .generate(&prompt)
                    .context("Generative model failed")?;
                let answer = normalize_generated(&output);
                tracing::debug!("Generative answer: {}", answer);
                Ok(answer)
            }
            AnswerStrategy::Extractive => {
                let model = self
                    .extractive
                    .as_mut()
                    .ok_or(RetrievalError::ModelNotConfigured(strategy))?;
                let context = contexts.join("\n");
                let span = model
                    .extract(question, &context)
                    .context("Extractive model failed")?;
                tracing::debug!("Extractive span (score {:.3}): {}", span.score, span.text);
                Ok(normalize_extracted(&span, self.min_confidence))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct FixedGenerator {
        output: String,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl GenerativeModel for FixedGenerator {
        fn generate(&mut self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.output.clone())
        }
    }

    struct FixedExtractor {
        span: ExtractedSpan,
        contexts: Arc<Mutex<Vec<String>>>,
    }

    impl ExtractiveModel for FixedExtractor {
        fn extract(&mut self, _question: &str, context: &str) -> Result<ExtractedSpan> {
            self.contexts.lock().unwrap().push(context.to_string());
            Ok(self.span.clone())
        }
    }

    fn generator(output: &str) -> (AnswerSynthesizer, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let synthesizer = AnswerSynthesizer::new().with_generative(Box::new(FixedGenerator {
            output: output.to_string(),
            prompts: Arc::clone(&prompts),
        }));
        (synthesizer, prompts)
    }

    fn extractor(text: &str, score: f32) -> (AnswerSynthesizer, Arc<Mutex<Vec<String>>>) {
        let contexts = Arc::new(Mutex::new(Vec::new()));
        let synthesizer = AnswerSynthesizer::new().with_extractive(Box::new(FixedExtractor {
            span: ExtractedSpan {
                text: text.to_string(),
                score,
            },
            contexts: Arc::clone(&contexts),
        }));
        (synthesizer, contexts)
    }

    fn contexts() -> Vec<String> {
        vec!["Paris is the capital.".to_string(), "France is in Europe.".to_string()]
    }

    #[test]
    fn test_strategy_parsing() {
        use clap::ValueEnum;

        let parse = |s: &str| AnswerStrategy::from_str(s, true);
        assert_eq!(parse("generative").unwrap(), AnswerStrategy::Generative);
        assert_eq!(parse("Extractive").unwrap(), AnswerStrategy::Extractive);
        assert_eq!(parse("google/flan-t5-small").unwrap(), AnswerStrategy::Generative);
        assert_eq!(
            parse("deepset/tinyroberta-squad2").unwrap(),
            AnswerStrategy::Extractive
        );
        assert!(parse("bert").is_err());
    }

    #[test]
    fn test_strategy_deserializes_model_alias() {
        #[derive(Deserialize)]
        struct Wrapper {
            strategy: AnswerStrategy,
        }
        let parsed: Wrapper = toml::from_str("strategy = \"deepset/tinyroberta-squad2\"").unwrap();
        assert_eq!(parsed.strategy, AnswerStrategy::Extractive);
    }

    #[test]
    fn test_prompt_contains_instruction_and_contexts() {
        let prompt = build_prompt("What is the capital?", &contexts());
        assert!(prompt.starts_with("You are a helpful and precise AI assistant.\n"));
        assert!(prompt.contains("respond with: \"not relevant to the context\"."));
        assert!(prompt.contains("Context:\nParis is the capital.\n\nFrance is in Europe.\n"));
        assert!(prompt.ends_with("Question: What is the capital?\n"));
    }

    #[test]
    fn test_generative_answer_passes_through() {
        let (mut synthesizer, prompts) = generator("  Paris  ");
        let answer = synthesizer
            .answer(AnswerStrategy::Generative, "What is the capital?", &contexts())
            .unwrap();
        assert_eq!(answer, "Paris");
        assert_eq!(prompts.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_generative_sentinel() {
        for output in ["", "   ", "This is Not Relevant here", "I don't know"] {
            let (mut synthesizer, _) = generator(output);
            let answer = synthesizer
                .answer(AnswerStrategy::Generative, "q", &contexts())
                .unwrap();
            assert_eq!(answer, NOT_RELEVANT_ANSWER, "output {:?}", output);
        }
    }

    #[test]
    fn test_extractive_joins_contexts_with_newlines() {
        let (mut synthesizer, seen) = extractor("Paris", 0.9);
        let answer = synthesizer
            .answer(AnswerStrategy::Extractive, "q", &contexts())
            .unwrap();
        assert_eq!(answer, "Paris");
        assert_eq!(
            seen.lock().unwrap()[0],
            "Paris is the capital.\nFrance is in Europe."
        );
    }

    #[test]
    fn test_extractive_low_confidence_sentinel() {
        let (mut synthesizer, _) = extractor("Paris", 0.05);
        let answer = synthesizer
            .answer(AnswerStrategy::Extractive, "q", &contexts())
            .unwrap();
        assert_eq!(answer, LOW_CONFIDENCE_ANSWER);

        let (mut synthesizer, _) = extractor("", 0.99);
        let answer = synthesizer
            .answer(AnswerStrategy::Extractive, "q", &contexts())
            .unwrap();
        assert_eq!(answer, LOW_CONFIDENCE_ANSWER);
    }

    #[test]
    fn test_min_confidence_is_configurable() {
        let (synthesizer, _) = extractor("Paris", 0.3);
        let mut synthesizer = synthesizer.with_min_confidence(0.5);
        let answer = synthesizer
            .answer(AnswerStrategy::Extractive, "q", &contexts())
            .unwrap();
        assert_eq!(answer, LOW_CONFIDENCE_ANSWER);
    }

    #[test]
    fn test_missing_model_is_config_error() {
        let (mut synthesizer, _) = generator("Paris");
        assert!(!synthesizer.supports(AnswerStrategy::Extractive));
        let err = synthesizer
            .answer(AnswerStrategy::Extractive, "q", &contexts())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RetrievalError>(),
            Some(RetrievalError::ModelNotConfigured(AnswerStrategy::Extractive))
        ));
    }
}
