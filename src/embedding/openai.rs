//! OpenAI-compatible embeddings client.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::{EmbeddingService, EmbeddingServiceError};
use crate::config::EmbeddingConfig;

/// Blocking client for `POST {base_url}/embeddings`.
///
/// One request per call; failures are returned as-is, never retried.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimension: usize,
    /// Only the text-embedding-3 family accepts a requested dimension
    request_dimension: bool,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: impl Into<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self, EmbeddingServiceError> {
        let model = model.into();
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|e| EmbeddingServiceError::Request(format!("invalid API key header: {e}")))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| EmbeddingServiceError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            request_dimension: model.starts_with("text-embedding-3"),
            model,
            dimension,
        })
    }

    /// Build from settings, reading the key from `config.api_key_env`.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingServiceError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| EmbeddingServiceError::MissingApiKey(config.api_key_env.clone()))?;

        Self::new(
            &api_key,
            &config.base_url,
            config.model.clone(),
            config.dimension,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

impl EmbeddingService for OpenAiEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(EmbeddingServiceError::EmptyInput);
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.request_dimension.then_some(self.dimension),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(status_error(status, body));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .map_err(|e| EmbeddingServiceError::MalformedResponse(e.to_string()))?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != texts.len() {
            return Err(EmbeddingServiceError::MalformedResponse(format!(
                "{} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        tracing::debug!(target: "embedding", "embedded {} texts with {}", texts.len(), self.model);
        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn transport_error(err: reqwest::Error) -> EmbeddingServiceError {
    if err.is_timeout() {
        EmbeddingServiceError::Timeout(err.to_string())
    } else {
        EmbeddingServiceError::Request(err.to_string())
    }
}

fn status_error(status: StatusCode, body: String) -> EmbeddingServiceError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        EmbeddingServiceError::RateLimited(body)
    } else {
        EmbeddingServiceError::Status {
            status: status.as_u16(),
            body,
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let input = ["a", "b"];
        let request = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &input,
            dimensions: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"][1], "b");
        assert!(json.get("dimensions").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"object":"list","data":[{"object":"embedding","index":1,"embedding":[0.5]},{"object":"embedding","index":0,"embedding":[0.25]}],"model":"m"}"#;
        let mut parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();
        parsed.data.sort_by_key(|e| e.index);
        assert_eq!(parsed.data[0].embedding, vec![0.25]);
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "quota".into()),
            EmbeddingServiceError::RateLimited(_)
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            EmbeddingServiceError::Status { status: 401, .. }
        ));
    }

    #[test]
    fn test_empty_input_rejected_before_request() {
        let embedder = OpenAiEmbedder::new(
            "sk-test",
            "http://127.0.0.1:9",
            "text-embedding-3-small",
            8,
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(matches!(
            embedder.embed_batch(&["ok", " "]),
            Err(EmbeddingServiceError::EmptyInput)
        ));
        assert!(embedder.embed_batch(&[]).unwrap().is_empty());
    }
}
