//! OpenAI-compatible chat completions client.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{GenerationParams, GenerationServiceError, TextGenerator};
use crate::config::GenerationConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiChatClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationServiceError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Build from settings, reading the key from `config.api_key_env`.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationServiceError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GenerationServiceError::MissingApiKey(config.api_key_env.clone()))?;

        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{base}/chat/completions")
        } else {
            format!("{base}/v1/chat/completions")
        }
    }

    /// Non-streaming chat completion.
    pub fn chat(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, GenerationServiceError> {
        let body = ChatRequest {
            model: params.model.as_deref().unwrap_or(&self.model),
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationServiceError::Timeout(e.to_string())
                } else {
                    GenerationServiceError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| GenerationServiceError::Request(format!("failed to read response: {e}")))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationServiceError::RateLimited(text));
        }
        if !status.is_success() {
            return Err(GenerationServiceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let content = parse_content(&text)?;
        tracing::debug!(target: "rag", "generated {} chars with {}", content.len(), body.model);
        Ok(content)
    }
}

impl TextGenerator for OpenAiChatClient {
    fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationServiceError> {
        self.chat(&[Message::user(prompt)], params)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

/// Extract `choices[0].message.content`.
fn parse_content(body: &str) -> Result<String, GenerationServiceError> {
    let json: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| GenerationServiceError::MalformedResponse(e.to_string()))?;

    json["choices"]
        .get(0)
        .and_then(|c| c["message"]["content"].as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| GenerationServiceError::MalformedResponse("no choices[0].message.content".into()))
}
