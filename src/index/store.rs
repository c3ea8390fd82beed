//! Named on-disk indexes.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<name>/meta.json     format version, model, dimension, metric, counts
//! <root>/<name>/chunks.json   chunk texts and provenance
//! <root>/<name>/vectors.bin   little-endian f32, row-major
//! ```
//!
//! `save` writes into a hidden staging directory and then swaps it in, so a
//! failed save never leaves a half-written index under the name. Concurrent
//! saves to one name are last-writer-wins.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use serde::{Deserialize, Serialize};

use super::{EmbeddingIndex, SimilarityMetric};
use crate::document::Chunk;
use crate::error::{RagError, RagResult};

const FORMAT_VERSION: u32 = 1;
const META_FILE: &str = "meta.json";
const CHUNKS_FILE: &str = "chunks.json";
const VECTORS_FILE: &str = "vectors.bin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub format_version: u32,
    pub model: String,
    pub dimension: usize,
    pub metric: SimilarityMetric,
    pub chunk_count: usize,
    pub created_at: String,
}

/// A stored index as shown by `list`.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub name: String,
    pub meta: IndexMeta,
}

#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
}

impl IndexStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of the index called `name`.
    pub fn index_dir(&self, name: &str) -> RagResult<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.index_dir(name)
            .map(|dir| dir.join(META_FILE).is_file())
            .unwrap_or(false)
    }

    /// Persist `index` under `name`, replacing any index of that name.
    pub fn save(&self, index: &EmbeddingIndex, name: &str) -> RagResult<PathBuf> {
        let target = self.index_dir(name)?;
        fs::create_dir_all(&self.root)?;

        let staging = self
            .root
            .join(format!(".{name}.staging-{}", std::process::id()));
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        if let Err(e) = write_index(index, &staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        if target.exists() {
            fs::remove_dir_all(&target)?;
        }
        fs::rename(&staging, &target)?;

        tracing::info!(
            target: "index",
            "saved index '{name}' ({} chunks) to {}",
            index.len(),
            target.display()
        );
        Ok(target)
    }

    /// Load the index called `name`. Vectors are memory-mapped.
    pub fn load(&self, name: &str) -> RagResult<EmbeddingIndex> {
        let dir = self.index_dir(name)?;
        let meta_path = dir.join(META_FILE);
        if !meta_path.is_file() {
            return Err(RagError::IndexNotFound {
                name: name.to_string(),
                path: dir,
            });
        }

        let corrupt = |reason: String| RagError::CorruptIndex {
            name: name.to_string(),
            reason,
        };

        let meta: IndexMeta = serde_json::from_str(&fs::read_to_string(&meta_path)?)
            .map_err(|e| corrupt(format!("unreadable {META_FILE}: {e}")))?;
        if meta.format_version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "format version {} (expected {FORMAT_VERSION})",
                meta.format_version
            )));
        }

        let chunks: Vec<Chunk> = serde_json::from_str(&fs::read_to_string(dir.join(CHUNKS_FILE))?)
            .map_err(|e| corrupt(format!("unreadable {CHUNKS_FILE}: {e}")))?;
        if chunks.is_empty() || chunks.len() != meta.chunk_count {
            return Err(corrupt(format!(
                "{} chunks, metadata says {}",
                chunks.len(),
                meta.chunk_count
            )));
        }

        let file = File::open(dir.join(VECTORS_FILE))?;
        let expected_len = (meta.chunk_count * meta.dimension * 4) as u64;
        let actual_len = file.metadata()?.len();
        if meta.dimension == 0 || actual_len != expected_len {
            return Err(corrupt(format!(
                "{VECTORS_FILE} is {actual_len} bytes, expected {expected_len}"
            )));
        }

        // SAFETY: the file is only replaced by renaming a new directory over
        // it, never truncated in place; the length was checked above.
        let map = unsafe { Mmap::map(&file)? };

        tracing::debug!(
            target: "index",
            "loaded index '{name}': {} chunks, {} dims, {}",
            meta.chunk_count,
            meta.dimension,
            meta.metric
        );
        Ok(EmbeddingIndex::from_mapped(&meta, chunks, map))
    }

    /// Every readable index under the root, sorted by name.
    pub fn list(&self) -> RagResult<Vec<IndexSummary>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !entry.file_type()?.is_dir() {
                continue;
            }

            let meta_path = entry.path().join(META_FILE);
            let meta = fs::read_to_string(&meta_path)
                .ok()
                .and_then(|text| serde_json::from_str::<IndexMeta>(&text).ok());
            match meta {
                Some(meta) => summaries.push(IndexSummary { name, meta }),
                None => {
                    tracing::warn!(target: "index", "skipping unreadable index at {}", entry.path().display())
                }
            }
        }

        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    /// Delete the index called `name`.
    pub fn remove(&self, name: &str) -> RagResult<()> {
        let dir = self.index_dir(name)?;
        if !dir.is_dir() {
            return Err(RagError::IndexNotFound {
                name: name.to_string(),
                path: dir,
            });
        }
        fs::remove_dir_all(&dir)?;
        tracing::info!(target: "index", "removed index '{name}'");
        Ok(())
    }
}

fn write_index(index: &EmbeddingIndex, dir: &Path) -> RagResult<()> {
    let meta = IndexMeta {
        format_version: FORMAT_VERSION,
        model: index.model().to_string(),
        dimension: index.dimension(),
        metric: index.metric(),
        chunk_count: index.len(),
        created_at: index.created_at().to_string(),
    };

    fs::write(dir.join(META_FILE), serde_json::to_string_pretty(&meta)?)?;
    fs::write(dir.join(CHUNKS_FILE), serde_json::to_string(index.chunks())?)?;
    fs::write(dir.join(VECTORS_FILE), index.vector_bytes())?;
    Ok(())
}

/// A name must be one plain path component.
fn validate_name(name: &str) -> RagResult<()> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name
            .chars()
            .any(|c| c == '/' || c == '\\' || c == ':' || c.is_control());
    if invalid {
        return Err(RagError::InvalidIndexName(name.to_string()));
    }
    Ok(())
}
