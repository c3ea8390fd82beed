//! Ingest command: extraction, filtering and chunking statistics.

use std::path::Path;

use anyhow::Result;

use super::{heading, ingest_file};
use crate::config::Settings;

const PREVIEW_CHARS: usize = 160;

pub fn run(settings: &Settings, file: &Path, json: bool) -> Result<()> {
    let report = ingest_file(settings, file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", heading("Ingestion"));
    println!("  Document:        {}", report.document);
    println!("  Pages:           {}", report.page_count);
    println!(
        "  Relevant pages:  {} {}",
        report.relevant_pages.len(),
        format_pages(&report.relevant_pages)
    );
    println!("  Chunks:          {}", report.chunks.len());

    if report.is_empty() {
        eprintln!("\nNo relevant content found. Check extraction.keywords in settings.toml.");
        return Ok(());
    }

    if let Some(first) = report.chunks.first() {
        println!("\n{}", heading("First chunk"));
        println!("  {}...", first.preview(PREVIEW_CHARS).replace('\n', " "));
    }
    Ok(())
}

/// 1-based page numbers, e.g. `(pages 2, 5, 9)`.
fn format_pages(indices: &[usize]) -> String {
    if indices.is_empty() {
        return String::new();
    }
    let numbers: Vec<String> = indices.iter().map(|i| (i + 1).to_string()).collect();
    format!("(pages {})", numbers.join(", "))
}
