//! Chunking configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for page chunking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Chunk length in characters. Every chunk but a page's last has exactly this length.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Characters shared by adjacent chunks of the same page.
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,

    /// End chunks at the last sentence boundary inside the window when there is one.
    #[serde(default)]
    pub prefer_sentence_boundary: bool,
}

fn default_max_chunk_chars() -> usize {
    800
}

fn default_overlap_chars() -> usize {
    150
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            overlap_chars: default_overlap_chars(),
            prefer_sentence_boundary: false,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkingConfigError {
    #[error("max_chunk_chars must be greater than zero")]
    ZeroLength,

    #[error("overlap_chars ({overlap}) must be less than max_chunk_chars ({max})")]
    OverlapTooLarge { overlap: usize, max: usize },
}

impl ChunkingConfig {
    pub fn new(max_chunk_chars: usize, overlap_chars: usize) -> Self {
        Self {
            max_chunk_chars,
            overlap_chars,
            prefer_sentence_boundary: false,
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ChunkingConfigError> {
        if self.max_chunk_chars == 0 {
            return Err(ChunkingConfigError::ZeroLength);
        }

        if self.overlap_chars >= self.max_chunk_chars {
            return Err(ChunkingConfigError::OverlapTooLarge {
                overlap: self.overlap_chars,
                max: self.max_chunk_chars,
            });
        }

        Ok(())
    }

    /// Distance between the starts of adjacent chunks.
    pub fn step(&self) -> usize {
        self.max_chunk_chars - self.overlap_chars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunking_config_defaults() {
        let config = ChunkingConfig::default();
        assert_eq!(config.max_chunk_chars, 800);
        assert_eq!(config.overlap_chars, 150);
        assert!(!config.prefer_sentence_boundary);
        assert_eq!(config.step(), 650);
    }

    #[test]
    fn test_chunking_config_validation() {
        assert!(ChunkingConfig::default().validate().is_ok());

        assert_eq!(
            ChunkingConfig::new(0, 0).validate(),
            Err(ChunkingConfigError::ZeroLength)
        );
        assert_eq!(
            ChunkingConfig::new(100, 100).validate(),
            Err(ChunkingConfigError::OverlapTooLarge {
                overlap: 100,
                max: 100
            })
        );
        assert!(ChunkingConfig::new(1, 0).validate().is_ok());
    }
}
