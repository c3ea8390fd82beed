//! Ingestion pipeline: extract, filter, chunk.
//!
//! ```text
//! EXTRACT → FILTER → CHUNK
//!    │         │        │
//!    ▼         ▼        ▼
//! [pages]  [relevant] [chunks]
//! ```
//!
//! Extraction runs on the calling thread. Filtering and per-page splitting run
//! on a bounded rayon pool; results come back in page order.

use std::sync::Arc;
use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;

use super::chunker::{Chunker, FixedSizeChunker, chunk_pages};
use super::config::ChunkingConfig;
use super::extract::extract_pages;
use super::filter::{KeywordFilter, PagePredicate, filter_pages};
use super::types::{Chunk, Document, DocumentId};
use crate::config::Settings;
use crate::error::RagResult;

/// Outcome of one ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub document: DocumentId,

    /// Pages extracted from the document
    pub page_count: usize,

    /// 0-based indices of the pages that passed the filter
    pub relevant_pages: Vec<usize>,

    pub chunks: Vec<Chunk>,
}

impl IngestReport {
    /// True when no page passed the filter.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

pub struct IngestPipeline {
    pool: ThreadPool,
    predicate: Arc<dyn PagePredicate>,
    chunker: Arc<dyn Chunker>,
    chunking: ChunkingConfig,
}

impl IngestPipeline {
    /// Create a pipeline with an explicit predicate and chunking configuration.
    pub fn new(
        predicate: Arc<dyn PagePredicate>,
        chunking: ChunkingConfig,
        worker_threads: usize,
    ) -> RagResult<Self> {
        chunking.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_threads.max(1))
            .thread_name(|i| format!("ingest-{i}"))
            .build()?;

        Ok(Self {
            pool,
            predicate,
            chunker: Arc::new(FixedSizeChunker::new()),
            chunking,
        })
    }

    /// Create a pipeline with the keyword filter and chunking from settings.
    pub fn from_settings(settings: &Settings) -> RagResult<Self> {
        let filter = KeywordFilter::new(&settings.extraction.keywords);
        Self::new(
            Arc::new(filter),
            settings.chunking.clone(),
            settings.extraction.worker_threads,
        )
    }

    /// Replace the chunking strategy.
    pub fn with_chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn chunking(&self) -> &ChunkingConfig {
        &self.chunking
    }

    /// Run the document through all stages.
    ///
    /// An extraction failure aborts the run. A document with no relevant pages
    /// yields an empty report.
    pub fn run(&self, document: &Document) -> RagResult<IngestReport> {
        let started = Instant::now();
        let pages = extract_pages(document)?;

        let (relevant, chunks) = self.pool.install(|| {
            let relevant = filter_pages(&pages, self.predicate.as_ref());
            let chunks = chunk_pages(relevant.as_slice(), self.chunker.as_ref(), &self.chunking);
            (relevant, chunks)
        });

        tracing::info!(
            target: "ingest",
            "{}: {} pages, {} relevant, {} chunks in {:?}",
            document.name(),
            pages.len(),
            relevant.len(),
            chunks.len(),
            started.elapsed()
        );

        Ok(IngestReport {
            document: document.id(),
            page_count: pages.len(),
            relevant_pages: relevant.iter().map(|p| p.index).collect(),
            chunks,
        })
    }
}
