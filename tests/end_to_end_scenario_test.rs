//! A small filing through the whole pipeline: extract, filter, chunk,
//! embed, index, retrieve and prompt.

use std::sync::Arc;

use filingrag::document::{ChunkingConfig, KeywordFilter};
use filingrag::embedding::EmbeddingServiceError;
use filingrag::index::{IndexBuilder, IndexStore};
use filingrag::llm::{GenerationParams, GenerationServiceError};
use filingrag::{Document, EmbeddingService, IngestPipeline, Responder, TextGenerator};
use parking_lot::Mutex;
use tempfile::TempDir;

/// Counts "alpha" and "omega" so retrieval is predictable.
struct CountingEmbedder;

impl EmbeddingService for CountingEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingServiceError> {
        Ok(texts
            .iter()
            .map(|t| {
                vec![
                    t.matches("alpha").count() as f32,
                    t.matches("omega").count() as f32,
                    1.0,
                ]
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "counting"
    }
}

#[derive(Default)]
struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
}

impl TextGenerator for RecordingGenerator {
    fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, GenerationServiceError> {
        self.prompts.lock().push(prompt.to_string());
        Ok("The filing discusses omega exposure.".to_string())
    }
}

fn risk_page() -> String {
    let head: String = format!("Risk Factors {}", "alpha ".repeat(200))
        .chars()
        .take(800)
        .collect();
    let tail: String = "omega ".repeat(40).chars().take(200).collect();
    format!("{head}{tail}")
}

fn filing() -> Document {
    let text = format!("Cover page\x0c{}\x0cSignatures\x0c", risk_page());
    Document::new("acme-10k.txt", text.into_bytes())
}

fn pipeline() -> IngestPipeline {
    IngestPipeline::new(
        Arc::new(KeywordFilter::new(&["risk factors"])),
        ChunkingConfig::new(800, 100),
        2,
    )
    .unwrap()
}

#[test]
fn test_filing_is_filtered_and_chunked() {
    let report = pipeline().run(&filing()).unwrap();

    assert_eq!(report.page_count, 3);
    assert_eq!(report.relevant_pages, vec![1]);
    assert_eq!(report.chunks.len(), 2);

    let first = &report.chunks[0];
    let second = &report.chunks[1];
    assert_eq!((first.ordinal, first.page, first.char_range), (0, 1, (0, 800)));
    assert_eq!((second.ordinal, second.page, second.char_range), (1, 1, (700, 1000)));

    let page: Vec<char> = risk_page().chars().collect();
    let rebuilt: String = first.text.chars().chain(second.text.chars().skip(100)).collect();
    assert_eq!(rebuilt, page.iter().collect::<String>());
}

#[test]
fn test_question_retrieves_matching_chunk_and_prompts_with_it() {
    let report = pipeline().run(&filing()).unwrap();
    let embedder = CountingEmbedder;
    let index = IndexBuilder::new(&embedder).build(&report.chunks).unwrap();

    let generator = RecordingGenerator::default();
    let responder = Responder::new(&embedder, &generator);
    let answer = responder.answer(&index, "What about omega?", 1).unwrap();

    assert_eq!(answer.text, "The filing discusses omega exposure.");
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(answer.sources[0].ordinal, 1);
    assert_eq!(answer.sources[0].page, 2);

    let prompts = generator.prompts.lock();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(&report.chunks[1].text));
    assert!(prompts[0].contains("What about omega?"));
    assert!(!prompts[0].contains(&report.chunks[0].text));
}

#[test]
fn test_saved_index_answers_like_the_built_one() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    let report = pipeline().run(&filing()).unwrap();
    let embedder = CountingEmbedder;
    let built = IndexBuilder::new(&embedder).build(&report.chunks).unwrap();
    store.save(&built, "acme").unwrap();
    let loaded = store.load("acme").unwrap();

    let query = embedder.embed("alpha alpha").unwrap();
    let from_built = built.search(&query, 2).unwrap();
    let from_loaded = loaded.search(&query, 2).unwrap();
    assert_eq!(from_built, from_loaded);
    assert_eq!(from_loaded[0].chunk.ordinal, 0);
}
