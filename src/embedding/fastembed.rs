//! Local ONNX embeddings through fastembed.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

use super::{EmbeddingService, EmbeddingServiceError};
use crate::config::EmbeddingConfig;

/// A single fastembed model behind a lock; the model needs `&mut` to embed.
pub struct FastEmbedService {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedService {
    /// Load the model, downloading it into the cache directory on first use.
    pub fn new(
        model: EmbeddingModel,
        model_name: impl Into<String>,
        config: &EmbeddingConfig,
    ) -> Result<Self, EmbeddingServiceError> {
        let cache_dir = config.effective_cache_path().join("models");
        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(true),
        )
        .map_err(|e| EmbeddingServiceError::Unavailable(format!("failed to load model: {e}")))?;

        // Embed once to learn the dimension
        let dimension = text_model
            .embed(vec!["dimension check"], None)
            .map_err(|e| EmbeddingServiceError::Unavailable(e.to_string()))?
            .into_iter()
            .next()
            .map(|v| v.len())
            .ok_or_else(|| EmbeddingServiceError::MalformedResponse("no vector for the dimension check".into()))?;

        Ok(Self {
            model: Mutex::new(text_model),
            model_name: model_name.into(),
            dimension,
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingServiceError> {
        let model = match config.model.to_ascii_lowercase().as_str() {
            "bge-small-en-v1.5" | "bgesmallenv15" => EmbeddingModel::BGESmallENV15,
            "multilingual-e5-small" | "multilinguale5small" => EmbeddingModel::MultilingualE5Small,
            _ => EmbeddingModel::AllMiniLML6V2,
        };
        let name = format!("fastembed-{model:?}");
        let service = Self::new(model, name, config)?;

        tracing::info!(
            target: "embedding",
            "fastembed model ready: {} ({} dims)",
            service.model_name,
            service.dimension
        );
        Ok(service)
    }
}

impl EmbeddingService for FastEmbedService {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(EmbeddingServiceError::EmptyInput);
        }

        self.model
            .lock()
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingServiceError::Unavailable(e.to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
