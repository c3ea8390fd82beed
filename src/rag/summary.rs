//! Filing summaries for two audiences.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::prompt::render;
use crate::config::SummaryConfig;
use crate::document::{Chunk, KeywordFilter};
use crate::error::{RagError, RagResult};
use crate::llm::{GenerationParams, TextGenerator};

const BEGINNER_PROMPT: &str = "You are a financial analyst creating a summary for beginner investors with no financial background.

Summarize the company's 10-K report in 300-500 words using simple, clear language. Avoid technical jargon and explain any necessary terms in plain English. Structure the summary as follows:
1. **What the Company Does**
2. **Key Financial Results**
3. **Management's Outlook**
4. **Why It Matters**
Content:
{content}";

const PROFESSIONAL_PROMPT: &str = "You are a senior equity research analyst at a top investment firm.

Summarize the company's 10-K report in 500-700 words using concise, analytical language suitable for professional investors. Structure the summary as follows:
1. **Business Model and Operations**
2. **Segment Performance**
3. **Key Risks and Opportunities**
4. **Forward-looking Commentary**
5. **Industry Context**
Content:
{content}";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryStyle {
    /// Plain language for readers with no financial background
    #[default]
    Beginner,
    /// Analytical language for professional investors
    Professional,
}

impl SummaryStyle {
    fn template(self) -> &'static str {
        match self {
            Self::Beginner => BEGINNER_PROMPT,
            Self::Professional => PROFESSIONAL_PROMPT,
        }
    }

    pub fn max_tokens(self) -> u32 {
        match self {
            Self::Beginner => 512,
            Self::Professional => 1024,
        }
    }
}

/// Chunks mentioning a summary keyword, capped at `max_paragraphs`.
///
/// Falls back to the leading chunks when none mention a keyword.
pub fn select_paragraphs<'c>(chunks: &'c [Chunk], config: &SummaryConfig) -> Vec<&'c str> {
    let filter = KeywordFilter::new(&config.keywords);
    let selected: Vec<&str> = chunks
        .iter()
        .filter(|c| filter.matches(&c.text))
        .take(config.max_paragraphs)
        .map(|c| c.text.as_str())
        .collect();

    if selected.is_empty() {
        chunks
            .iter()
            .take(config.max_paragraphs)
            .map(|c| c.text.as_str())
            .collect()
    } else {
        selected
    }
}

pub fn summary_prompt(paragraphs: &[&str], style: SummaryStyle) -> String {
    render(style.template(), &[("content", paragraphs.join("\n").as_str())])
}

/// Summarize the session's chunks in the given style.
pub fn summarize(
    generator: &dyn TextGenerator,
    chunks: &[Chunk],
    style: SummaryStyle,
    config: &SummaryConfig,
) -> RagResult<String> {
    if chunks.is_empty() {
        return Err(RagError::NoContent);
    }

    let paragraphs = select_paragraphs(chunks, config);
    tracing::debug!(target: "rag", "summarizing {} of {} chunks ({style:?})", paragraphs.len(), chunks.len());

    let params = GenerationParams::new(config.temperature, style.max_tokens());
    Ok(generator.generate(&summary_prompt(&paragraphs, style), &params)?)
}
