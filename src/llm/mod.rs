//! Text-generation services.

pub mod openai;

pub use openai::OpenAiChatClient;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationServiceError {
    #[error("Rate limited by generation service: {0}")]
    RateLimited(String),

    #[error("Generation request timed out: {0}")]
    Timeout(String),

    #[error("Generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Generation request failed: {0}")]
    Request(String),

    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("API key not set: export {0}")]
    MissingApiKey(String),
}

impl GenerationServiceError {
    /// True for failures that may succeed if the whole operation is re-run later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Timeout(_) | Self::Request(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Sampling parameters for one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Overrides the client's default model
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationParams {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            model: None,
            temperature,
            max_tokens,
        }
    }
}

/// Turns a prompt into text.
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationServiceError>;
}
