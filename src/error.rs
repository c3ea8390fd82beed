//! Error taxonomy for the retrieval pipeline.
//!
//! Every failure is terminal for the operation in progress. Nothing here is
//! retried internally; callers decide whether to re-run the whole operation.

use std::path::PathBuf;

use thiserror::Error;

use crate::document::ChunkingConfigError;
use crate::embedding::EmbeddingServiceError;
use crate::llm::GenerationServiceError;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Failed to extract text from '{document}': {reason}")]
    Extraction { document: String, reason: String },

    #[error("Invalid chunking settings: {0}")]
    Chunking(#[from] ChunkingConfigError),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Embedding service error: {0}")]
    EmbeddingService(#[from] EmbeddingServiceError),

    #[error("Cannot build index: {0}")]
    IndexBuild(String),

    #[error("Index '{name}' not found at {}", path.display())]
    IndexNotFound { name: String, path: PathBuf },

    #[error("Invalid index name '{0}': must be a single path component")]
    InvalidIndexName(String),

    #[error("Index '{name}' is corrupt: {reason}")]
    CorruptIndex { name: String, reason: String },

    #[error("Generation service error: {0}")]
    GenerationService(#[from] GenerationServiceError),

    #[error("No index is loaded in this session")]
    NoActiveIndex,

    #[error("No filing content in this session")]
    NoContent,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RagError {
    pub fn extraction(document: impl Into<String>, reason: impl ToString) -> Self {
        Self::Extraction {
            document: document.into(),
            reason: reason.to_string(),
        }
    }

    /// Short, user-facing hint for what to do next.
    pub fn remedy(&self) -> &'static str {
        match self {
            Self::Extraction { .. } => {
                "Re-upload the filing as a complete PDF or UTF-8 text export"
            }
            Self::Chunking(_) => {
                "Set [chunking] overlap_chars below max_chunk_chars in settings.toml"
            }
            Self::WorkerPool(_) => "Lower extraction.worker_threads in settings.toml",
            Self::EmbeddingService(e) if e.is_transient() => {
                "The embedding service is throttling or unreachable; retry later"
            }
            Self::EmbeddingService(_) => {
                "Check the embedding settings (model, endpoint, API key) and retry"
            }
            Self::IndexBuild(_) => {
                "Ingest a filing with relevant content before building an index"
            }
            Self::IndexNotFound { .. } => {
                "Build the index first or check the index name with 'filingrag index list'"
            }
            Self::InvalidIndexName(_) => "Use a plain name without slashes, e.g. 'acme-2024'",
            Self::CorruptIndex { .. } => "Rebuild the index under the same name",
            Self::GenerationService(e) if e.is_transient() => {
                "The generation service is throttling or timed out; retry later"
            }
            Self::GenerationService(_) => {
                "Check the generation settings (model, endpoint, API key) and retry"
            }
            Self::NoActiveIndex => "Load or build an index before asking questions",
            Self::NoContent => "Ingest a filing whose pages match the configured keywords",
            Self::Io(_) => "Check file permissions and free disk space",
            Self::Serialization(_) => "The stored data is unreadable; rebuild it",
        }
    }
}

pub type RagResult<T> = Result<T, RagError>;
