//! Embedding index: vectors paired 1:1 with chunks, searchable by similarity.
//!
//! An index is immutable once built. Search is an exact scan over every
//! vector, which is plenty for the few hundred chunks a single filing yields.

pub mod builder;
pub mod store;

pub use builder::{IndexBuilder, IndexProgress};
pub use store::{IndexMeta, IndexStore, IndexSummary};

use std::borrow::Cow;
use std::cmp::Ordering;

use memmap2::Mmap;
use serde::{Deserialize, Serialize};

use crate::document::Chunk;
use crate::embedding::EmbeddingServiceError;
use crate::error::{RagError, RagResult};

/// Vector similarity used for ranking.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    InnerProduct,
}

impl SimilarityMetric {
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        match self {
            Self::InnerProduct => dot,
            Self::Cosine => {
                let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    0.0
                } else {
                    dot / (norm_a * norm_b)
                }
            }
        }
    }
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cosine => f.pad("cosine"),
            Self::InnerProduct => f.pad("inner-product"),
        }
    }
}

/// Row-major f32 vectors, in memory or mapped from `vectors.bin`.
enum Vectors {
    Owned(Vec<f32>),
    /// Little-endian f32 bytes
    Mapped(Mmap),
}

impl Vectors {
    fn row(&self, index: usize, dimension: usize) -> Cow<'_, [f32]> {
        let start = index * dimension;
        match self {
            Self::Owned(values) => Cow::Borrowed(&values[start..start + dimension]),
            Self::Mapped(map) => Cow::Owned(
                map[start * 4..(start + dimension) * 4]
                    .chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect(),
            ),
        }
    }
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// 0-based rank, best first
    pub rank: usize,
    pub score: f32,
    pub chunk: Chunk,
}

pub struct EmbeddingIndex {
    model: String,
    dimension: usize,
    metric: SimilarityMetric,
    created_at: String,
    chunks: Vec<Chunk>,
    vectors: Vectors,
}

impl std::fmt::Debug for EmbeddingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingIndex")
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("metric", &self.metric)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

impl EmbeddingIndex {
    /// Assemble an index from chunks and their vectors, in the same order.
    pub fn new(
        model: impl Into<String>,
        metric: SimilarityMetric,
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
    ) -> RagResult<Self> {
        if chunks.is_empty() {
            return Err(RagError::IndexBuild("no chunks to index".to_string()));
        }
        if chunks.len() != vectors.len() {
            return Err(RagError::IndexBuild(format!(
                "{} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let dimension = vectors[0].len();
        if dimension == 0 {
            return Err(RagError::IndexBuild("zero-dimension vectors".to_string()));
        }

        let mut flat = Vec::with_capacity(dimension * vectors.len());
        for vector in &vectors {
            if vector.len() != dimension {
                return Err(EmbeddingServiceError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                }
                .into());
            }
            flat.extend_from_slice(vector);
        }

        Ok(Self {
            model: model.into(),
            dimension,
            metric,
            created_at: crate::utils::now_rfc3339(),
            chunks,
            vectors: Vectors::Owned(flat),
        })
    }

    /// Wrap a mapped `vectors.bin`. The caller has checked its length.
    pub(crate) fn from_mapped(meta: &IndexMeta, chunks: Vec<Chunk>, map: Mmap) -> Self {
        Self {
            model: meta.model.clone(),
            dimension: meta.dimension,
            metric: meta.metric,
            created_at: meta.created_at.clone(),
            chunks,
            vectors: Vectors::Mapped(map),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Vector of the chunk at `position`.
    pub fn vector(&self, position: usize) -> Option<Cow<'_, [f32]>> {
        (position < self.chunks.len()).then(|| self.vectors.row(position, self.dimension))
    }

    /// Little-endian bytes of every vector, row-major.
    pub(crate) fn vector_bytes(&self) -> Vec<u8> {
        match &self.vectors {
            Vectors::Owned(values) => crate::utils::encode_f32_le(values),
            Vectors::Mapped(map) => map.to_vec(),
        }
    }

    /// The `k` chunks most similar to `query`, best first.
    ///
    /// Equal scores keep original chunk order.
    pub fn search(&self, query: &[f32], k: usize) -> RagResult<Vec<SearchHit>> {
        if query.len() != self.dimension {
            return Err(EmbeddingServiceError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            }
            .into());
        }

        let mut scored: Vec<(usize, f32)> = (0..self.chunks.len())
            .map(|i| (i, self.metric.score(query, &self.vectors.row(i, self.dimension))))
            .collect();

        scored.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => self.chunks[a.0].ordinal.cmp(&self.chunks[b.0].ordinal),
            other => other,
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, (i, score))| SearchHit {
                rank,
                score,
                chunk: self.chunks[i].clone(),
            })
            .collect())
    }
}
