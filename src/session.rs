//! Per-session state: the ingested chunks, the active index and Q&A history.
//!
//! One session serves one user. Nothing here is shared or locked.

use std::collections::VecDeque;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::{Chunk, Document, DocumentId, IngestPipeline, IngestReport};
use crate::error::{RagError, RagResult};
use crate::index::{EmbeddingIndex, IndexBuilder};
use crate::rag::{Answer, Responder};

/// Style label recorded for retrieval-augmented answers.
pub const FILING_STYLE: &str = "filing";

/// What an ingestion did to the session.
#[derive(Debug)]
pub enum IngestOutcome {
    /// New chunks replaced the previous set
    Ingested(IngestReport),
    /// Same document as last time; nothing changed
    Unchanged(DocumentId),
    /// No page passed the filter; previous chunks kept
    NoRelevantContent(IngestReport),
}

/// One answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaRecord {
    pub id: u64,
    pub question: String,
    pub style: String,
    pub answer: String,
    pub favorite: bool,
    pub asked_at: String,
}

#[derive(Debug)]
struct ActiveIndex {
    name: Option<String>,
    index: EmbeddingIndex,
}

#[derive(Debug, Default)]
pub struct SessionContext {
    document: Option<DocumentId>,
    chunks: Vec<Chunk>,
    index: Option<ActiveIndex>,
    /// Most recent first
    history: VecDeque<QaRecord>,
    next_id: u64,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `document` through `pipeline` unless it was the last one ingested.
    pub fn ingest(&mut self, pipeline: &IngestPipeline, document: &Document) -> RagResult<IngestOutcome> {
        let id = document.id();
        if self.document.as_ref() == Some(&id) {
            tracing::debug!(target: "session", "{id} already ingested");
            return Ok(IngestOutcome::Unchanged(id));
        }

        let report = pipeline.run(document)?;
        if report.is_empty() {
            tracing::info!(target: "session", "{id}: no relevant content, keeping previous chunks");
            return Ok(IngestOutcome::NoRelevantContent(report));
        }

        self.document = Some(id);
        self.chunks = report.chunks.clone();
        Ok(IngestOutcome::Ingested(report))
    }

    pub fn document(&self) -> Option<&DocumentId> {
        self.document.as_ref()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Make `index` the one questions are asked against.
    pub fn set_index(&mut self, name: Option<String>, index: EmbeddingIndex) {
        tracing::debug!(target: "session", "active index: {}", name.as_deref().unwrap_or("<unsaved>"));
        self.index = Some(ActiveIndex { name, index });
    }

    /// Embed the session's chunks and make the result the active, unsaved
    /// index. Returns the number of chunks indexed.
    pub fn index_chunks(&mut self, builder: &IndexBuilder<'_>) -> RagResult<usize> {
        if self.chunks.is_empty() {
            return Err(RagError::NoContent);
        }
        let index = builder.build(&self.chunks)?;
        self.set_index(None, index);
        Ok(self.chunks.len())
    }

    pub fn index(&self) -> Option<&EmbeddingIndex> {
        self.index.as_ref().map(|active| &active.index)
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index.as_ref().and_then(|active| active.name.as_deref())
    }

    /// Answer against the active index and record the result.
    pub fn ask(&mut self, responder: &Responder<'_>, question: &str, k: usize) -> RagResult<(u64, Answer)> {
        let index = self.index().ok_or(RagError::NoActiveIndex)?;
        let answer = responder.answer(index, question, k)?;
        let id = self.record(question, FILING_STYLE, &answer.text);
        Ok((id, answer))
    }

    /// Add an answered question to the history and return its id.
    pub fn record(&mut self, question: &str, style: &str, answer: &str) -> u64 {
        self.next_id += 1;
        self.history.push_front(QaRecord {
            id: self.next_id,
            question: question.to_string(),
            style: style.to_string(),
            answer: answer.to_string(),
            favorite: false,
            asked_at: crate::utils::now_rfc3339(),
        });
        self.next_id
    }

    /// Flag or unflag a record. Returns false if no record has `id`.
    pub fn mark_favorite(&mut self, id: u64, favorite: bool) -> bool {
        match self.history.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.favorite = favorite;
                true
            }
            None => false,
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &QaRecord> {
        self.history.iter()
    }

    /// The `n` most recent records.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &QaRecord> {
        self.history.iter().take(n)
    }

    pub fn favorites(&self) -> impl Iterator<Item = &QaRecord> {
        self.history.iter().filter(|record| record.favorite)
    }

    /// Drop chunks, index and history.
    pub fn clear(&mut self) {
        *self = Self {
            next_id: self.next_id,
            ..Self::default()
        };
        tracing::debug!(target: "session", "session cleared");
    }

    /// Write the history, most recent first, as pretty JSON.
    pub fn export_history(&self, path: &Path) -> RagResult<()> {
        let records: Vec<&QaRecord> = self.history.iter().collect();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&records)?)?;
        Ok(())
    }
}
