//! Filing ingestion: text extraction, relevance filtering and chunking.
//!
//! This module provides:
//! - Page-level extraction from PDF and form-feed separated text
//! - A replaceable page predicate (keyword heuristic by default)
//! - Fixed-length chunking with exact overlap
//! - A pipeline composing the three on a bounded worker pool

pub mod chunker;
pub mod config;
pub mod extract;
pub mod filter;
pub mod pipeline;
pub mod types;

pub use chunker::{Chunker, FixedSizeChunker, RawChunk, chunk_pages};
pub use config::{ChunkingConfig, ChunkingConfigError};
pub use extract::{PdfExtractor, PlainTextExtractor, TextExtractor, extract_pages};
pub use filter::{KeywordFilter, PagePredicate, filter_pages};
pub use pipeline::{IngestPipeline, IngestReport};
pub use types::{Chunk, Document, DocumentId, Page, Pages};
