//! CLI module for filingrag.
//!
//! Provides command-line interface parsing and command dispatch.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, IndexAction};

use anyhow::Result;

use crate::config::Settings;

/// Load settings, start logging and run the selected command.
pub fn run(cli: Cli) -> Result<()> {
    if let Commands::Init { force } = cli.command {
        return commands::init::run_init(force);
    }

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| anyhow::anyhow!("failed to load settings: {e}"))?;

    crate::logging::init_with_config(&settings.logging);
    tracing::debug!(target: "cli", "settings loaded, index path {}", settings.index_path.display());

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Config => commands::init::run_config(&settings),
        Commands::Ingest { file, json } => commands::ingest::run(&settings, &file, json),
        Commands::Index { action } => commands::index::run(&settings, action),
        Commands::Ask {
            question,
            index,
            k,
            show_context,
            json,
        } => commands::ask::run(
            &settings,
            &commands::ask::AskOptions {
                question,
                index,
                k,
                show_context,
                json,
            },
        ),
        Commands::Summarize { file, style } => commands::summarize::run(&settings, &file, style),
        Commands::Explain { question, style } => commands::explain::run(&settings, &question, style),
        Commands::Chat { index } => commands::chat::run(&settings, index.as_deref()),
    }
}
