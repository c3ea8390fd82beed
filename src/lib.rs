//! Retrieval-augmented question answering over annual-report filings.
//!
//! A filing flows through extraction, page filtering and chunking
//! ([`document`]), is embedded into a persisted vector index ([`index`]),
//! and is queried by the responder in [`rag`].

pub mod cli;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod session;
pub mod utils;

pub use config::Settings;
pub use document::{Chunk, Document, DocumentId, IngestPipeline, IngestReport, Page};
pub use embedding::EmbeddingService;
pub use error::{RagError, RagResult};
pub use index::{EmbeddingIndex, IndexStore, SearchHit};
pub use llm::TextGenerator;
pub use rag::{Answer, Responder};
pub use session::SessionContext;
