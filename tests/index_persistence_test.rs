use std::fs;

use filingrag::document::Chunk;
use filingrag::embedding::HashEmbedder;
use filingrag::index::{IndexBuilder, IndexStore, SimilarityMetric};
use filingrag::{EmbeddingService, RagError};
use tempfile::TempDir;

fn chunks() -> Vec<Chunk> {
    [
        "Our revenue depends on a small number of customers.",
        "Interest rate changes could raise our borrowing costs.",
        "We face intense competition in every market we serve.",
        "Cybersecurity incidents could disrupt our operations.",
    ]
    .iter()
    .enumerate()
    .map(|(ordinal, text)| Chunk {
        ordinal,
        page: ordinal / 2,
        char_range: (0, text.chars().count()),
        text: text.to_string(),
    })
    .collect()
}

fn build_and_save(store: &IndexStore, name: &str) -> filingrag::index::EmbeddingIndex {
    let embedder = HashEmbedder::new(512);
    let index = IndexBuilder::new(&embedder)
        .batch_size(3)
        .metric(SimilarityMetric::InnerProduct)
        .build(&chunks())
        .unwrap();
    store.save(&index, name).unwrap();
    index
}

#[test]
fn test_round_trip_preserves_chunks_vectors_and_metadata() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    let built = build_and_save(&store, "acme-2024");

    let loaded = store.load("acme-2024").unwrap();
    assert_eq!(loaded.model(), "hash-512");
    assert_eq!(loaded.dimension(), 512);
    assert_eq!(loaded.metric(), SimilarityMetric::InnerProduct);
    assert_eq!(loaded.created_at(), built.created_at());
    assert_eq!(loaded.chunks(), built.chunks());
    for position in 0..built.len() {
        assert_eq!(loaded.vector(position), built.vector(position));
    }
}

#[test]
fn test_save_overwrites_and_leaves_no_staging_dirs() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    build_and_save(&store, "acme");
    build_and_save(&store, "acme");

    let entries: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["acme".to_string()]);
}

#[test]
fn test_list_and_remove() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    build_and_save(&store, "zeta");
    build_and_save(&store, "alpha");

    let names: Vec<String> = store.list().unwrap().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);

    store.remove("zeta").unwrap();
    assert!(!store.exists("zeta"));
    assert!(matches!(store.remove("zeta"), Err(RagError::IndexNotFound { .. })));
}

#[test]
fn test_missing_and_invalid_names() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());

    assert!(matches!(store.load("nope"), Err(RagError::IndexNotFound { .. })));
    for bad in ["", "../escape", "a/b", ".hidden"] {
        assert!(
            matches!(store.load(bad), Err(RagError::InvalidIndexName(_))),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn test_truncated_vectors_are_reported_as_corrupt() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    build_and_save(&store, "acme");

    let vectors = temp.path().join("acme").join("vectors.bin");
    let bytes = fs::read(&vectors).unwrap();
    fs::write(&vectors, &bytes[..bytes.len() - 4]).unwrap();

    assert!(matches!(store.load("acme"), Err(RagError::CorruptIndex { .. })));
}

#[test]
fn test_loaded_index_searches_with_same_embedder() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path());
    build_and_save(&store, "acme");
    let loaded = store.load("acme").unwrap();

    let embedder = HashEmbedder::new(512);
    let query = embedder.embed("competition in every market").unwrap();
    let hits = loaded.search(&query, 2).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk.ordinal, 2);
    assert!(hits[0].score >= hits[1].score);
}
