//! Index management: build, list, remove.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::{embedding_service, heading, index_store, ingest_file};
use crate::cli::IndexAction;
use crate::config::Settings;
use crate::index::IndexBuilder;

pub fn run(settings: &Settings, action: IndexAction) -> Result<()> {
    match action {
        IndexAction::Build {
            file,
            name,
            no_progress,
        } => run_build(settings, &file, &name, !no_progress),
        IndexAction::List { json } => run_list(settings, json),
        IndexAction::Remove { name } => {
            index_store(settings).remove(&name)?;
            println!("Removed index '{name}'");
            Ok(())
        }
    }
}

fn run_build(settings: &Settings, file: &Path, name: &str, show_progress: bool) -> Result<()> {
    let started = Instant::now();
    let store = index_store(settings);
    // Reject a bad name before spending time on embeddings
    store.index_dir(name)?;

    let report = ingest_file(settings, file)?;
    println!(
        "Ingested {}: {} of {} pages relevant, {} chunks",
        report.document,
        report.relevant_pages.len(),
        report.page_count,
        report.chunks.len()
    );

    let embedder = embedding_service(settings)?;
    let builder = IndexBuilder::new(embedder.as_ref())
        .batch_size(settings.embedding.batch_size)
        .metric(settings.retrieval.metric);

    let bar = if show_progress && !report.is_empty() {
        let bar = ProgressBar::new(report.chunks.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:30.cyan/blue}] {pos}/{len} chunks ({eta})")?
                .progress_chars("█▓░"),
        );
        bar.set_message("Embedding");
        Some(bar)
    } else {
        None
    };

    let result = builder.build_with_progress(&report.chunks, |progress| {
        if let Some(bar) = &bar {
            bar.set_position(progress.current as u64);
        }
    });
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
    let index = result?;

    let path = store.save(&index, name)?;
    println!(
        "{} index '{}' ({} chunks, {} dims, {}) in {:.1}s",
        style("Saved").green().bold(),
        name,
        index.len(),
        index.dimension(),
        index.model(),
        started.elapsed().as_secs_f64()
    );
    println!("  {}", path.display());
    Ok(())
}

fn run_list(settings: &Settings, json: bool) -> Result<()> {
    let summaries = index_store(settings).list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        eprintln!("No indexes under {}", settings.index_path.display());
        return Ok(());
    }

    println!("{}", heading("Indexes"));
    for summary in summaries {
        let meta = &summary.meta;
        println!(
            "  {:<24} {:>5} chunks  {:>5} dims  {:<14} {}  {}",
            summary.name, meta.chunk_count, meta.dimension, meta.metric, meta.created_at, meta.model
        );
    }
    Ok(())
}
