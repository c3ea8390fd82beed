//! Summarize command.

use std::path::Path;

use anyhow::Result;

use super::{heading, ingest_file, text_generator};
use crate::config::Settings;
use crate::error::RagError;
use crate::rag::{SummaryStyle, summarize};

pub fn run(settings: &Settings, file: &Path, style: SummaryStyle) -> Result<()> {
    let report = ingest_file(settings, file)?;
    if report.is_empty() {
        return Err(RagError::NoContent.into());
    }

    let generator = text_generator(settings)?;
    let summary = summarize(generator.as_ref(), &report.chunks, style, &settings.summary)?;

    println!("{}", heading("Summary"));
    println!("{summary}");
    Ok(())
}
