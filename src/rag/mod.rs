//! Answering questions about an ingested filing.
//!
//! - [`Responder`]: retrieval-augmented answers against an index
//! - [`summary`]: whole-filing summaries
//! - [`general`]: finance questions answered without retrieval

pub mod context;
pub mod general;
pub mod prompt;
pub mod responder;
pub mod summary;

pub use context::{Context, assemble_context};
pub use general::{AnswerStyle, explain};
pub use prompt::{NOT_FOUND_IN_CONTEXT, risk_analyst_prompt};
pub use responder::{Answer, Responder, Source};
pub use summary::{SummaryStyle, summarize};
