//! Builds an [`EmbeddingIndex`] from chunks.

use super::{EmbeddingIndex, SimilarityMetric};
use crate::document::Chunk;
use crate::embedding::{EmbeddingService, EmbeddingServiceError};
use crate::error::{RagError, RagResult};

/// Default number of chunks per embedding call.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Progress after each embedded batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexProgress {
    /// Chunks embedded so far
    pub current: usize,
    pub total: usize,
}

/// Embeds chunks in batches and assembles the index.
///
/// All-or-nothing: the first embedding failure aborts the build and nothing
/// is returned.
pub struct IndexBuilder<'a> {
    service: &'a dyn EmbeddingService,
    batch_size: usize,
    metric: SimilarityMetric,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(service: &'a dyn EmbeddingService) -> Self {
        Self {
            service,
            batch_size: DEFAULT_BATCH_SIZE,
            metric: SimilarityMetric::default(),
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn build(&self, chunks: &[Chunk]) -> RagResult<EmbeddingIndex> {
        self.build_with_progress(chunks, |_| {})
    }

    pub fn build_with_progress<F>(&self, chunks: &[Chunk], mut on_progress: F) -> RagResult<EmbeddingIndex>
    where
        F: FnMut(IndexProgress),
    {
        if chunks.is_empty() {
            return Err(RagError::IndexBuild(
                "no chunks to index (no relevant content was ingested)".to_string(),
            ));
        }

        let expected = self.service.dimension();
        let total = chunks.len();
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(total);

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self.service.embed_batch(&texts)?;

            if embeddings.len() != batch.len() {
                return Err(EmbeddingServiceError::MalformedResponse(format!(
                    "{} embeddings for {} chunks",
                    embeddings.len(),
                    batch.len()
                ))
                .into());
            }
            if let Some(bad) = embeddings.iter().find(|v| v.len() != expected) {
                return Err(EmbeddingServiceError::DimensionMismatch {
                    expected,
                    actual: bad.len(),
                }
                .into());
            }

            vectors.extend(embeddings);
            on_progress(IndexProgress {
                current: vectors.len(),
                total,
            });
        }

        tracing::info!(
            target: "index",
            "embedded {total} chunks with {} ({expected} dims)",
            self.service.model_name()
        );

        EmbeddingIndex::new(
            self.service.model_name(),
            self.metric,
            chunks.to_vec(),
            vectors,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;

    struct Failing;

    impl EmbeddingService for Failing {
        fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingServiceError> {
            Err(EmbeddingServiceError::RateLimited("quota exceeded".to_string()))
        }

        fn dimension(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    /// Declares one dimension, returns another.
    struct Lying;

    impl EmbeddingService for Lying {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingServiceError> {
            Ok(texts.iter().map(|_| vec![0.5; 3]).collect())
        }

        fn dimension(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "lying"
        }
    }

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n)
            .map(|i| Chunk {
                ordinal: i,
                page: i / 2,
                char_range: (0, 6),
                text: format!("chunk {i}"),
            })
            .collect()
    }

    #[test]
    fn test_build_reports_progress_per_batch() {
        let embedder = HashEmbedder::new(32);
        let mut progress = Vec::new();
        let index = IndexBuilder::new(&embedder)
            .batch_size(2)
            .build_with_progress(&chunks(5), |p| progress.push(p.current))
            .unwrap();

        assert_eq!(progress, vec![2, 4, 5]);
        assert_eq!(index.len(), 5);
        assert_eq!(index.dimension(), 32);
        assert_eq!(index.model(), "hash-32");
    }

    #[test]
    fn test_empty_chunks_is_build_error() {
        let embedder = HashEmbedder::new(8);
        assert!(matches!(
            IndexBuilder::new(&embedder).build(&[]),
            Err(RagError::IndexBuild(_))
        ));
    }

    #[test]
    fn test_embedding_failure_propagates() {
        let result = IndexBuilder::new(&Failing).build(&chunks(3));
        assert!(matches!(
            result,
            Err(RagError::EmbeddingService(EmbeddingServiceError::RateLimited(_)))
        ));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let result = IndexBuilder::new(&Lying).build(&chunks(1));
        assert!(matches!(
            result,
            Err(RagError::EmbeddingService(
                EmbeddingServiceError::DimensionMismatch {
                    expected: 4,
                    actual: 3
                }
            ))
        ));
    }
}
