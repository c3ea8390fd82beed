//! Explain command: general finance questions.

use anyhow::Result;

use super::{heading, text_generator};
use crate::config::Settings;
use crate::rag::{AnswerStyle, explain};

pub fn run(settings: &Settings, question: &str, style: AnswerStyle) -> Result<()> {
    let generator = text_generator(settings)?;
    let answer = explain(generator.as_ref(), question, style)?;

    println!("{}", heading(&format!("Answer ({})", style.label())));
    println!("{answer}");
    Ok(())
}
