//! Interactive chat over a saved index or a filing ingested in the session.
//!
//! Plain lines are answered from the filing. Lines starting with `/` are
//! session commands, see [`HELP`].

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::ValueEnum;
use console::style;

use super::ask::print_answer;
use super::{embedding_service, heading, index_store, text_generator};
use crate::config::Settings;
use crate::document::{Document, IngestPipeline};
use crate::error::{RagError, RagResult};
use crate::index::IndexBuilder;
use crate::rag::{AnswerStyle, Responder, SummaryStyle, explain, summarize};
use crate::session::{IngestOutcome, QaRecord, SessionContext};

const HELP: &str = "\
  <question>             Ask about the loaded filing
  /ingest <file>         Read a filing and index it for this session
  /summarize [style]     Summarize the ingested filing (beginner, professional)
  /general <question>    General finance question, plain English
  /analytical <question> General finance question, analyst style
  /fav <id>              Mark an answer as favorite
  /unfav <id>            Remove the favorite mark
  /history [n]           Show recent questions (default 10)
  /favorites             Show favorite answers
  /export <path>         Write the history as JSON
  /clear                 Forget the history
  /help                  Show this help
  /quit                  Leave the session";

const DEFAULT_HISTORY: usize = 10;

#[derive(Debug, PartialEq)]
enum ChatCommand {
    Ask(String),
    Ingest(PathBuf),
    Summarize(SummaryStyle),
    General(String, AnswerStyle),
    Favorite(u64, bool),
    History(usize),
    Favorites,
    Export(PathBuf),
    Clear,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

fn parse_line(line: &str) -> ChatCommand {
    let line = line.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ChatCommand::Ask(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match (name, arg) {
        ("quit" | "exit" | "q", _) => ChatCommand::Quit,
        ("help" | "h", _) => ChatCommand::Help,
        ("clear", _) => ChatCommand::Clear,
        ("favorites", _) => ChatCommand::Favorites,
        ("history", "") => ChatCommand::History(DEFAULT_HISTORY),
        ("history", n) => match n.parse() {
            Ok(n) => ChatCommand::History(n),
            Err(_) => ChatCommand::Invalid(format!("not a count: {n}")),
        },
        ("ingest", "") => ChatCommand::Invalid("/ingest needs a file".to_string()),
        ("ingest", path) => ChatCommand::Ingest(PathBuf::from(path)),
        ("summarize", "") => ChatCommand::Summarize(SummaryStyle::default()),
        ("summarize", s) => match SummaryStyle::from_str(s, true) {
            Ok(style) => ChatCommand::Summarize(style),
            Err(_) => ChatCommand::Invalid(format!("unknown summary style: {s}")),
        },
        ("general" | "analytical", "") => ChatCommand::Invalid(format!("/{name} needs a question")),
        ("general", q) => ChatCommand::General(q.to_string(), AnswerStyle::PlainEnglish),
        ("analytical", q) => ChatCommand::General(q.to_string(), AnswerStyle::Analytical),
        ("fav" | "unfav", id) => match id.parse() {
            Ok(id) => ChatCommand::Favorite(id, name == "fav"),
            Err(_) => ChatCommand::Invalid(format!("/{name} needs an answer id")),
        },
        ("export", "") => ChatCommand::Invalid("/export needs a path".to_string()),
        ("export", path) => ChatCommand::Export(PathBuf::from(path)),
        _ => ChatCommand::Invalid(format!("unknown command /{name}")),
    }
}

pub fn run(settings: &Settings, index_name: Option<&str>) -> Result<()> {
    let store = index_store(settings);
    let embedder = embedding_service(settings)?;
    let generator = text_generator(settings)?;
    let responder = Responder::new(embedder.as_ref(), generator.as_ref()).with_settings(settings);
    let builder = IndexBuilder::new(embedder.as_ref())
        .batch_size(settings.embedding.batch_size)
        .metric(settings.retrieval.metric);
    let pipeline = IngestPipeline::from_settings(settings)?;

    let mut session = SessionContext::new();
    match index_name {
        Some(name) => {
            session.set_index(Some(name.to_string()), store.load(name)?);
            println!("Loaded index '{name}'. Type a question, /help for commands, /quit to leave.");
        }
        None => println!("No index loaded. Use /ingest <file> first, /help for commands."),
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", style(">").cyan().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        match parse_line(&line?) {
            ChatCommand::Empty => {}
            ChatCommand::Quit => break,
            ChatCommand::Help => println!("{HELP}"),
            ChatCommand::Invalid(message) => eprintln!("{}", style(message).yellow()),
            ChatCommand::Ask(question) => {
                match session.ask(&responder, &question, settings.retrieval.top_k) {
                    Ok((id, answer)) => {
                        print_answer(&answer, false);
                        println!("{}", style(format!("[answer #{id}]")).dim());
                    }
                    Err(e) => report(&e),
                }
            }
            ChatCommand::Ingest(path) => {
                if let Err(e) = ingest(&mut session, &pipeline, &builder, &path) {
                    report(&e);
                }
            }
            ChatCommand::Summarize(summary_style) => {
                match summarize(generator.as_ref(), session.chunks(), summary_style, &settings.summary) {
                    Ok(summary) => {
                        println!("{}", heading("Summary"));
                        println!("{summary}");
                    }
                    Err(e) => report(&e),
                }
            }
            ChatCommand::General(question, answer_style) => {
                match explain(generator.as_ref(), &question, answer_style) {
                    Ok(text) => {
                        let id = session.record(&question, answer_style.label(), &text);
                        println!("{}", heading(&format!("Answer ({})", answer_style.label())));
                        println!("{text}");
                        println!("{}", style(format!("[answer #{id}]")).dim());
                    }
                    Err(e) => report(&e),
                }
            }
            ChatCommand::Favorite(id, favorite) => {
                if session.mark_favorite(id, favorite) {
                    println!("Updated answer #{id}");
                } else {
                    eprintln!("{}", style(format!("no answer #{id}")).yellow());
                }
            }
            ChatCommand::History(n) => print_records(session.recent(n)),
            ChatCommand::Favorites => print_records(session.favorites()),
            ChatCommand::Export(path) => match session.export_history(&path) {
                Ok(()) => println!("History written to {}", path.display()),
                Err(e) => report(&e),
            },
            ChatCommand::Clear => {
                session.clear();
                if let Some(name) = index_name {
                    session.set_index(Some(name.to_string()), store.load(name)?);
                }
                println!("History cleared");
            }
        }
    }
    Ok(())
}

/// Ingest `path` into the session and index its chunks on success.
fn ingest(
    session: &mut SessionContext,
    pipeline: &IngestPipeline,
    builder: &IndexBuilder<'_>,
    path: &std::path::Path,
) -> RagResult<()> {
    let document = Document::from_path(path)?;
    match session.ingest(pipeline, &document)? {
        IngestOutcome::Ingested(report) => {
            let indexed = session.index_chunks(builder)?;
            println!(
                "Ingested {}: {} of {} pages relevant, {indexed} chunks indexed",
                report.document, report.relevant_pages.len(), report.page_count
            );
        }
        IngestOutcome::Unchanged(id) => println!("{id} is already loaded"),
        IngestOutcome::NoRelevantContent(report) => eprintln!(
            "{}",
            style(format!(
                "{}: no page matched the extraction keywords, keeping the previous filing",
                report.document
            ))
            .yellow()
        ),
    }
    Ok(())
}

fn report(error: &RagError) {
    eprintln!("{} {error}", style("error:").red().bold());
    eprintln!("  {}", style(error.remedy()).dim());
}

fn print_records<'a>(records: impl Iterator<Item = &'a QaRecord>) {
    let mut any = false;
    for record in records {
        any = true;
        let star = if record.favorite { "*" } else { " " };
        println!(
            "{star} #{:<4} [{}] {}",
            record.id,
            record.style,
            style(&record.question).bold()
        );
    }
    if !any {
        println!("(nothing yet)");
    }
}
