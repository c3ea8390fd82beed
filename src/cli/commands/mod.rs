//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod ask;
pub mod chat;
pub mod explain;
pub mod index;
pub mod ingest;
pub mod init;
pub mod summarize;

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use crate::config::Settings;
use crate::document::{Document, IngestPipeline, IngestReport};
use crate::embedding::{self, EmbeddingService};
use crate::error::RagError;
use crate::index::IndexStore;
use crate::llm::{OpenAiChatClient, TextGenerator};

/// Read a filing from disk and run the ingestion pipeline on it.
pub(crate) fn ingest_file(settings: &Settings, path: &Path) -> Result<IngestReport> {
    let document = Document::from_path(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let pipeline = IngestPipeline::from_settings(settings)?;
    Ok(pipeline.run(&document)?)
}

pub(crate) fn embedding_service(settings: &Settings) -> Result<Box<dyn EmbeddingService>> {
    embedding::from_settings(&settings.embedding).map_err(|e| RagError::from(e).into())
}

pub(crate) fn text_generator(settings: &Settings) -> Result<Box<dyn TextGenerator>> {
    let client = OpenAiChatClient::from_config(&settings.generation).map_err(RagError::from)?;
    Ok(Box::new(client))
}

pub(crate) fn index_store(settings: &Settings) -> IndexStore {
    IndexStore::new(&settings.index_path)
}

/// Bold cyan section heading, as in clap's help output.
pub(crate) fn heading(text: &str) -> String {
    style(text).cyan().bold().to_string()
}
