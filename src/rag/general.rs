//! General financial questions, answered without retrieval.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::prompt::render;
use crate::error::RagResult;
use crate::llm::{GenerationParams, TextGenerator};

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 1024;

const PLAIN_ENGLISH_TEMPLATE: &str = "You are a financial educator. Explain the following investment or finance-related question in clear, simple terms suitable for a beginner. Use analogies or examples when needed.

Question: {question}";

const ANALYTICAL_TEMPLATE: &str = "You are a professional financial analyst. Answer the following question using accurate terminology and examples. Structure your response logically and clearly.

Question: {question}";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AnswerStyle {
    /// Beginner-friendly explanation with analogies
    #[default]
    PlainEnglish,
    /// Structured answer with precise terminology
    Analytical,
}

impl AnswerStyle {
    pub fn label(self) -> &'static str {
        match self {
            Self::PlainEnglish => "plain-english",
            Self::Analytical => "analytical",
        }
    }

    pub fn prompt(self, question: &str) -> String {
        let template = match self {
            Self::PlainEnglish => PLAIN_ENGLISH_TEMPLATE,
            Self::Analytical => ANALYTICAL_TEMPLATE,
        };
        render(template, &[("question", question.trim())])
    }
}

/// Answer `question` in `style` straight from the generator.
pub fn explain(generator: &dyn TextGenerator, question: &str, style: AnswerStyle) -> RagResult<String> {
    let params = GenerationParams::new(TEMPERATURE, MAX_TOKENS);
    Ok(generator.generate(&style.prompt(question), &params)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::GenerationServiceError;

    struct Echo;

    impl TextGenerator for Echo {
        fn generate(
            &self,
            prompt: &str,
            params: &GenerationParams,
        ) -> Result<String, GenerationServiceError> {
            assert_eq!(params.temperature, 0.3);
            assert_eq!(params.max_tokens, 1024);
            Ok(prompt.to_string())
        }
    }

    #[test]
    fn test_styles_choose_persona() {
        let plain = explain(&Echo, "What is a PEG ratio? ", AnswerStyle::PlainEnglish).unwrap();
        assert!(plain.starts_with("You are a financial educator."));
        assert!(plain.ends_with("Question: What is a PEG ratio?"));

        let analytical = explain(&Echo, "What is ROE?", AnswerStyle::Analytical).unwrap();
        assert!(analytical.starts_with("You are a professional financial analyst."));
    }

    #[test]
    fn test_labels() {
        assert_eq!(AnswerStyle::PlainEnglish.label(), "plain-english");
        assert_eq!(
            serde_json::to_string(&AnswerStyle::Analytical).unwrap(),
            "\"analytical\""
        );
    }
}
