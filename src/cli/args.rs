//! CLI argument parsing using clap.
//!
//! Contains the Cli struct, Commands enum, and all subcommand enums.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::rag::{AnswerStyle, SummaryStyle};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

const QUICK_START: &str = "Quick Start:
  $ filingrag init                                  # Write .filingrag/settings.toml
  $ filingrag index build acme-10k.pdf --name acme  # Ingest and index a filing
  $ filingrag ask \"What are the liquidity risks?\" --index acme
  $ filingrag chat --index acme                     # Interactive session
  $ filingrag chat                                  # Session, then /ingest <file>";

/// Retrieval-augmented Q&A over 10-K filings
#[derive(Parser)]
#[command(
    name = "filingrag",
    version = env!("CARGO_PKG_VERSION"),
    about = "Ask questions about 10-K filings",
    long_about = "Extract the relevant sections of a 10-K filing, index them, and answer questions with a language model grounded in the filing text.",
    after_help = QUICK_START,
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Set up .filingrag directory with default configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Extract, filter and chunk a filing without indexing it
    Ingest {
        /// PDF or form-feed separated text export of the filing
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build, list and remove named indexes
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },

    /// Answer a question from an indexed filing
    Ask {
        /// The question
        question: String,

        /// Name of the index to search
        #[arg(short, long)]
        index: String,

        /// Number of chunks to retrieve (default: retrieval.top_k)
        #[arg(short)]
        k: Option<usize>,

        /// Print the context sent to the model
        #[arg(long)]
        show_context: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize a filing
    Summarize {
        /// PDF or text export of the filing
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = SummaryStyle::Beginner)]
        style: SummaryStyle,
    },

    /// Explain a general finance question (no filing needed)
    Explain {
        question: String,

        #[arg(long, value_enum, default_value_t = AnswerStyle::PlainEnglish)]
        style: AnswerStyle,
    },

    /// Interactive question session
    Chat {
        /// Name of a saved index to load; otherwise use /ingest in the session
        #[arg(short, long)]
        index: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum IndexAction {
    /// Ingest a filing and save its index under a name
    Build {
        file: PathBuf,

        /// Index name (one path component)
        #[arg(short, long)]
        name: String,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// List saved indexes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a saved index
    Remove { name: String },
}
