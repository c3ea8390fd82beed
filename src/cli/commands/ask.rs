//! Ask command: one retrieval-augmented answer.

use anyhow::Result;
use console::style;

use super::{embedding_service, heading, index_store, text_generator};
use crate::config::Settings;
use crate::rag::{Answer, Responder};

pub struct AskOptions {
    pub question: String,
    pub index: String,
    pub k: Option<usize>,
    pub show_context: bool,
    pub json: bool,
}

pub fn run(settings: &Settings, options: &AskOptions) -> Result<()> {
    let index = index_store(settings).load(&options.index)?;
    let embedder = embedding_service(settings)?;
    let generator = text_generator(settings)?;

    let responder = Responder::new(embedder.as_ref(), generator.as_ref()).with_settings(settings);
    let k = options.k.unwrap_or(settings.retrieval.top_k);
    let answer = responder.answer(&index, &options.question, k)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        print_answer(&answer, options.show_context);
    }
    Ok(())
}

pub(crate) fn print_answer(answer: &Answer, show_context: bool) {
    println!("{}", heading("Answer"));
    println!("{}\n", answer.text);

    let sources: Vec<String> = answer
        .sources
        .iter()
        .map(|s| format!("#{} p.{} ({:.3})", s.ordinal, s.page, s.score))
        .collect();
    println!("{} {}", style("Sources:").dim(), style(sources.join(", ")).dim());

    if answer.context.truncated {
        println!(
            "{}",
            style("Context was truncated to fit retrieval.max_context_chars").yellow()
        );
    }

    if show_context {
        println!("\n{}", heading("Context"));
        println!("{}", answer.context.text);
    }
}
