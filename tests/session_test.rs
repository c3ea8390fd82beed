use std::sync::Arc;

use filingrag::document::{ChunkingConfig, KeywordFilter};
use filingrag::embedding::HashEmbedder;
use filingrag::index::IndexBuilder;
use filingrag::llm::{GenerationParams, GenerationServiceError};
use filingrag::session::{FILING_STYLE, IngestOutcome, QaRecord};
use filingrag::{Document, IngestPipeline, RagError, Responder, SessionContext, TextGenerator};
use tempfile::TempDir;

struct Canned;

impl TextGenerator for Canned {
    fn generate(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, GenerationServiceError> {
        Ok("Supply chain disruption is the main risk.".to_string())
    }
}

fn pipeline() -> IngestPipeline {
    IngestPipeline::new(
        Arc::new(KeywordFilter::new(&["risk factors"])),
        ChunkingConfig::new(200, 40),
        2,
    )
    .unwrap()
}

fn filing(name: &str, body: &str) -> Document {
    Document::new(name, format!("Cover\x0c{body}").into_bytes())
}

#[test]
fn test_same_document_is_not_reingested() {
    let mut session = SessionContext::new();
    let doc = filing("a.txt", "Risk Factors: supply chain disruption could hurt margins.");

    assert!(matches!(session.ingest(&pipeline(), &doc).unwrap(), IngestOutcome::Ingested(_)));
    let chunks = session.chunks().to_vec();
    assert!(!chunks.is_empty());

    assert!(matches!(session.ingest(&pipeline(), &doc).unwrap(), IngestOutcome::Unchanged(_)));
    assert_eq!(session.chunks(), chunks.as_slice());
}

#[test]
fn test_irrelevant_document_keeps_previous_chunks() {
    let mut session = SessionContext::new();
    let relevant = filing("a.txt", "Risk Factors: supply chain disruption could hurt margins.");
    let irrelevant = filing("b.txt", "Exhibit list and signatures only.");

    session.ingest(&pipeline(), &relevant).unwrap();
    let before = session.chunks().to_vec();

    match session.ingest(&pipeline(), &irrelevant).unwrap() {
        IngestOutcome::NoRelevantContent(report) => assert!(report.chunks.is_empty()),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(session.chunks(), before.as_slice());
    assert_eq!(session.document().map(|d| d.name.as_str()), Some("a.txt"));
}

#[test]
fn test_ask_requires_an_index() {
    let mut session = SessionContext::new();
    let embedder = HashEmbedder::new(32);
    let responder = Responder::new(&embedder, &Canned);

    assert!(matches!(
        session.ask(&responder, "What are the risks?", 3),
        Err(RagError::NoActiveIndex)
    ));
    assert_eq!(session.history().count(), 0);
}

#[test]
fn test_ask_records_history_and_exports_it() {
    let mut session = SessionContext::new();
    let doc = filing("a.txt", "Risk Factors: supply chain disruption could hurt margins.");
    session.ingest(&pipeline(), &doc).unwrap();

    let embedder = HashEmbedder::new(64);
    let index = IndexBuilder::new(&embedder).build(session.chunks()).unwrap();
    session.set_index(Some("a".to_string()), index);
    assert_eq!(session.index_name(), Some("a"));

    let responder = Responder::new(&embedder, &Canned);
    let (id, answer) = session.ask(&responder, "What are the risks?", 3).unwrap();
    assert_eq!(answer.text, "Supply chain disruption is the main risk.");
    assert!(session.mark_favorite(id, true));

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("out").join("history.json");
    session.export_history(&path).unwrap();

    let records: Vec<QaRecord> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].style, FILING_STYLE);
    assert!(records[0].favorite);
}

#[test]
fn test_index_chunks_makes_an_unsaved_index_active() {
    let mut session = SessionContext::new();
    let embedder = HashEmbedder::new(64);

    assert!(matches!(
        session.index_chunks(&IndexBuilder::new(&embedder)),
        Err(RagError::NoContent)
    ));
    assert!(session.index().is_none());

    let doc = filing("a.txt", "Risk Factors: supply chain disruption could hurt margins.");
    session.ingest(&pipeline(), &doc).unwrap();
    let indexed = session.index_chunks(&IndexBuilder::new(&embedder).batch_size(1)).unwrap();

    assert_eq!(indexed, session.chunks().len());
    assert!(session.index().is_some());
    assert_eq!(session.index_name(), None);

    let responder = Responder::new(&embedder, &Canned);
    let (_, answer) = session.ask(&responder, "What are the risks?", 2).unwrap();
    assert!(!answer.sources.is_empty());
}
