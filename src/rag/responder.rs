//! Retrieval-augmented question answering.

use serde::Serialize;

use super::context::{Context, assemble_context};
use super::prompt::risk_analyst_prompt;
use crate::config::Settings;
use crate::embedding::EmbeddingService;
use crate::error::RagResult;
use crate::index::EmbeddingIndex;
use crate::llm::{GenerationParams, TextGenerator};

/// A retrieved chunk cited by an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub ordinal: usize,
    /// 1-based page number
    pub page: usize,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,
    pub text: String,
    /// Retrieved chunks, best first
    pub sources: Vec<Source>,
    pub context: Context,
}

/// Embeds the question, retrieves, bounds the context and asks the generator.
///
/// Every stage failure is returned to the caller; nothing is retried.
pub struct Responder<'a> {
    embedder: &'a dyn EmbeddingService,
    generator: &'a dyn TextGenerator,
    max_context_chars: usize,
    params: GenerationParams,
}

impl<'a> Responder<'a> {
    pub fn new(embedder: &'a dyn EmbeddingService, generator: &'a dyn TextGenerator) -> Self {
        let settings = Settings::default();
        Self {
            embedder,
            generator,
            max_context_chars: settings.retrieval.max_context_chars,
            params: GenerationParams::new(
                settings.generation.temperature,
                settings.generation.max_tokens,
            ),
        }
    }

    /// Context limit and sampling parameters from settings.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.max_context_chars = settings.retrieval.max_context_chars;
        self.params = GenerationParams::new(
            settings.generation.temperature,
            settings.generation.max_tokens,
        );
        self
    }

    pub fn max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }

    pub fn answer(&self, index: &EmbeddingIndex, question: &str, k: usize) -> RagResult<Answer> {
        if index.model() != self.embedder.model_name() {
            tracing::warn!(
                target: "rag",
                "index was built with '{}' but questions are embedded with '{}'",
                index.model(),
                self.embedder.model_name()
            );
        }

        let query = self.embedder.embed(question)?;
        let hits = index.search(&query, k)?;
        let context = assemble_context(&hits, self.max_context_chars);

        tracing::debug!(
            target: "rag",
            "retrieved {} chunks, context {} chars{}",
            hits.len(),
            context.text.chars().count(),
            if context.truncated { " (truncated)" } else { "" }
        );

        let prompt = risk_analyst_prompt(&context.text, question);
        let text = self.generator.generate(&prompt, &self.params)?;

        Ok(Answer {
            question: question.to_string(),
            text,
            sources: hits
                .iter()
                .map(|hit| Source {
                    ordinal: hit.chunk.ordinal,
                    page: hit.chunk.page + 1,
                    score: hit.score,
                })
                .collect(),
            context,
        })
    }
}
