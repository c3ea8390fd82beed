//! Embedding services.
//!
//! Every backend implements [`EmbeddingService`]. The index builder and the
//! responder only ever see the trait.
//!
//! Backends:
//! - [`OpenAiEmbedder`]: OpenAI-compatible `/embeddings` endpoint
//! - [`HashEmbedder`]: deterministic feature hashing, no network
//! - `FastEmbedService`: local ONNX model (feature `local-embeddings`)
//!
//! [`CachedEmbedder`] wraps any backend with a content-addressed disk cache.

pub mod cache;
#[cfg(feature = "local-embeddings")]
pub mod fastembed;
pub mod hash;
pub mod openai;

pub use cache::CachedEmbedder;
#[cfg(feature = "local-embeddings")]
pub use self::fastembed::FastEmbedService;
pub use hash::HashEmbedder;
pub use openai::OpenAiEmbedder;

use thiserror::Error;

use crate::config::{EmbeddingConfig, EmbeddingProvider};

#[derive(Error, Debug)]
pub enum EmbeddingServiceError {
    #[error("Rate limited by embedding service: {0}")]
    RateLimited(String),

    #[error("Embedding request timed out: {0}")]
    Timeout(String),

    #[error("Embedding service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Embedding request failed: {0}")]
    Request(String),

    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Cannot embed empty input")]
    EmptyInput,

    #[error("API key not set: export {0}")]
    MissingApiKey(String),

    #[error("Embedding backend unavailable: {0}")]
    Unavailable(String),
}

impl EmbeddingServiceError {
    /// True for failures that may succeed if the whole operation is re-run later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Timeout(_) | Self::Request(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Turns text into fixed-dimension vectors.
pub trait EmbeddingService: Send + Sync {
    /// Embed a batch, one vector per input, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingServiceError>;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingServiceError> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingServiceError::MalformedResponse("no vector returned".into()))
    }

    /// Dimension of every vector this service produces.
    fn dimension(&self) -> usize;

    /// Model identifier recorded in index metadata.
    fn model_name(&self) -> &str;
}

/// Build the configured embedding service, wrapped in the disk cache when enabled.
pub fn from_settings(
    config: &EmbeddingConfig,
) -> Result<Box<dyn EmbeddingService>, EmbeddingServiceError> {
    let service: Box<dyn EmbeddingService> = match config.provider {
        // Hashing is cheaper than a cache lookup
        EmbeddingProvider::Hash => return Ok(Box::new(HashEmbedder::new(config.dimension))),
        EmbeddingProvider::OpenAi => Box::new(OpenAiEmbedder::from_config(config)?),
        #[cfg(feature = "local-embeddings")]
        EmbeddingProvider::FastEmbed => Box::new(FastEmbedService::from_config(config)?),
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingProvider::FastEmbed => {
            return Err(EmbeddingServiceError::Unavailable(
                "rebuild with `--features local-embeddings` to use fastembed".to_string(),
            ));
        }
    };

    tracing::debug!(
        target: "embedding",
        "embedding service: {} ({} dims)",
        service.model_name(),
        service.dimension()
    );

    if config.cache {
        Ok(Box::new(CachedEmbedder::new(
            service,
            config.effective_cache_path(),
        )))
    } else {
        Ok(service)
    }
}
