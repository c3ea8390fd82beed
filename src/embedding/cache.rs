//! Content-addressed embedding cache.
//!
//! Vectors live at `<root>/<model>/<aa>/<sha256(model \0 text)>` as raw
//! little-endian f32. Entries never expire; a miss overwrites whatever is at
//! the path. Cache IO failures are logged and otherwise ignored.

use std::path::{Path, PathBuf};

use super::{EmbeddingService, EmbeddingServiceError};
use crate::utils::{content_hash, decode_f32_le, encode_f32_le};

pub struct CachedEmbedder {
    inner: Box<dyn EmbeddingService>,
    dir: PathBuf,
}

impl CachedEmbedder {
    pub fn new(inner: Box<dyn EmbeddingService>, root: impl AsRef<Path>) -> Self {
        let dir = root.as_ref().join(sanitize(inner.model_name()));
        Self { inner, dir }
    }

    /// Directory holding this model's entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, text: &str) -> PathBuf {
        let key = content_hash(&[self.inner.model_name(), text]);
        self.dir.join(&key[..2]).join(key)
    }

    fn lookup(&self, text: &str) -> Option<Vec<f32>> {
        let bytes = std::fs::read(self.entry_path(text)).ok()?;
        decode_f32_le(&bytes).filter(|v| v.len() == self.inner.dimension())
    }

    fn store(&self, text: &str, vector: &[f32]) {
        let path = self.entry_path(text);
        let result = path
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|_| std::fs::write(&path, encode_f32_le(vector)));
        if let Err(e) = result {
            tracing::warn!(target: "embedding", "failed to write cache entry {}: {e}", path.display());
        }
    }
}

impl EmbeddingService for CachedEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingServiceError> {
        let mut vectors: Vec<Option<Vec<f32>>> = texts.iter().map(|t| self.lookup(t)).collect();

        let missing: Vec<usize> = (0..texts.len()).filter(|&i| vectors[i].is_none()).collect();
        tracing::debug!(
            target: "embedding",
            "cache: {} hits, {} misses",
            texts.len() - missing.len(),
            missing.len()
        );

        if !missing.is_empty() {
            let inputs: Vec<&str> = missing.iter().map(|&i| texts[i]).collect();
            let fresh = self.inner.embed_batch(&inputs)?;
            if fresh.len() != inputs.len() {
                return Err(EmbeddingServiceError::MalformedResponse(format!(
                    "{} embeddings for {} inputs",
                    fresh.len(),
                    inputs.len()
                )));
            }
            for (i, vector) in missing.into_iter().zip(fresh) {
                if vector.len() == self.inner.dimension() {
                    self.store(texts[i], &vector);
                }
                vectors[i] = Some(vector);
            }
        }

        Ok(vectors.into_iter().flatten().collect())
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Model names may contain `/` or `:`; keep one path component.
fn sanitize(model: &str) -> String {
    model
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Counts the texts it is asked to embed.
    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl EmbeddingService for Counting {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingServiceError> {
            self.calls.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "org/counting:v1"
        }
    }

    #[test]
    fn test_second_call_hits_cache() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let cached = CachedEmbedder::new(
            Box::new(Counting {
                calls: calls.clone(),
            }),
            temp.path(),
        );

        let first = cached.embed_batch(&["abc", "de"]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let second = cached.embed_batch(&["de", "new text", "abc"]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(second[0], first[1]);
        assert_eq!(second[1], vec![8.0, 1.0]);
        assert_eq!(second[2], first[0]);
    }

    #[test]
    fn test_cache_survives_new_instance() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let make = || {
            CachedEmbedder::new(
                Box::new(Counting {
                    calls: calls.clone(),
                }),
                temp.path(),
            )
        };

        make().embed("risk factors").unwrap();
        make().embed("risk factors").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(make().dir().ends_with("org_counting_v1"));
    }

    #[test]
    fn test_corrupt_entry_is_recomputed() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let cached = CachedEmbedder::new(
            Box::new(Counting {
                calls: calls.clone(),
            }),
            temp.path(),
        );

        cached.embed("abc").unwrap();
        std::fs::write(cached.entry_path("abc"), [1u8, 2, 3]).unwrap();
        assert_eq!(cached.embed("abc").unwrap(), vec![3.0, 1.0]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
