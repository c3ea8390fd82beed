//! Page chunking.
//!
//! Provides the `Chunker` trait and a fixed-length sliding-window chunker.
//! Lengths and offsets are counted in Unicode scalar values, never bytes.
//!
//! For a page of `n` characters, length `L` and overlap `O`, chunks start at
//! `0, L-O, 2(L-O), ...` and the last chunk ends at `n`. Dropping the first `O`
//! characters of every chunk after the first and concatenating gives the page
//! back exactly.
//!
//! That holds for a [`Chunker`]'s output. [`chunk_pages`] then drops windows
//! that are whitespace only, since they carry nothing to embed, and numbers the
//! remaining chunks without gaps.

use rayon::prelude::*;

use super::config::ChunkingConfig;
use super::types::{Chunk, Page};

/// A chunk of one page before it gets a session ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    /// Character range in the page text (start, end).
    pub char_range: (usize, usize),

    pub content: String,
}

impl RawChunk {
    pub fn char_count(&self) -> usize {
        self.char_range.1 - self.char_range.0
    }
}

/// Trait for page chunking strategies.
pub trait Chunker: Send + Sync {
    /// Split one page of text into chunks. `config` must be valid.
    fn chunk(&self, text: &str, config: &ChunkingConfig) -> Vec<RawChunk>;
}

/// Sliding window of `max_chunk_chars` advancing by `max_chunk_chars - overlap_chars`.
///
/// With `prefer_sentence_boundary` a window may end early, at the last
/// sentence end that still leaves room for the overlap. The next window then
/// starts `overlap_chars` before that end, so overlap and reconstruction hold
/// either way.
#[derive(Debug, Default)]
pub struct FixedSizeChunker;

impl FixedSizeChunker {
    pub fn new() -> Self {
        Self
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, text: &str, config: &ChunkingConfig) -> Vec<RawChunk> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        if len == 0 {
            return Vec::new();
        }

        // Byte offset of every char position, plus the end
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(byte, _)| byte)
            .chain(std::iter::once(text.len()))
            .collect();

        let max = config.max_chunk_chars.max(1);
        let overlap = config.overlap_chars.min(max - 1);

        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let mut end = (start + max).min(len);
            if end < len && config.prefer_sentence_boundary {
                if let Some(boundary) = last_sentence_end(&chars, start + overlap + 1, end) {
                    end = boundary;
                }
            }

            chunks.push(RawChunk {
                char_range: (start, end),
                content: text[offsets[start]..offsets[end]].to_string(),
            });

            if end == len {
                break;
            }
            start = end - overlap;
        }

        chunks
    }
}

/// Largest position `p` in `[lo, hi]` that directly follows sentence punctuation
/// and precedes whitespace.
fn last_sentence_end(chars: &[char], lo: usize, hi: usize) -> Option<usize> {
    (lo.max(1)..=hi)
        .rev()
        .find(|&p| {
            p < chars.len() && matches!(chars[p - 1], '.' | '!' | '?') && chars[p].is_whitespace()
        })
}

/// Chunk every page on the current rayon pool and number the chunks in page order.
///
/// Whitespace-only windows are skipped.
pub fn chunk_pages(pages: &[Page], chunker: &dyn Chunker, config: &ChunkingConfig) -> Vec<Chunk> {
    let per_page: Vec<Vec<RawChunk>> = pages
        .par_iter()
        .map(|page| chunker.chunk(&page.text, config))
        .collect();

    pages
        .iter()
        .zip(per_page)
        .flat_map(|(page, raw)| raw.into_iter().map(move |r| (page.index, r)))
        .filter(|(_, raw)| !raw.content.trim().is_empty())
        .enumerate()
        .map(|(ordinal, (page, raw))| Chunk {
            ordinal,
            page,
            char_range: raw.char_range,
            text: raw.content,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(chunks: &[RawChunk], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let skip = if i == 0 { 0 } else { overlap };
            out.extend(chunk.content.chars().skip(skip));
        }
        out
    }

    fn sample_text(len: usize) -> String {
        "The quick brown fox jumps over the lazy dog. "
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    #[test]
    fn test_empty_content() {
        let chunks = FixedSizeChunker::new().chunk("", &ChunkingConfig::new(10, 2));
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_page_is_one_chunk() {
        let chunks = FixedSizeChunker::new().chunk("short page", &ChunkingConfig::new(800, 100));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "short page");
        assert_eq!(chunks[0].char_range, (0, 10));
    }

    #[test]
    fn test_thousand_chars_gives_two_chunks() {
        let text = sample_text(1000);
        let chunks = FixedSizeChunker::new().chunk(&text, &ChunkingConfig::new(800, 100));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].char_range, (0, 800));
        assert_eq!(chunks[1].char_range, (700, 1000));
        assert_eq!(chunks[1].content, text[700..]);
    }

    #[test]
    fn test_reconstruction_and_exact_lengths() {
        let chunker = FixedSizeChunker::new();
        for (len, max, overlap) in [(1, 5, 0), (37, 10, 3), (500, 64, 16), (641, 80, 79), (100, 1, 0)] {
            let text = sample_text(len);
            let config = ChunkingConfig::new(max, overlap);
            let chunks = chunker.chunk(&text, &config);

            assert_eq!(reassemble(&chunks, overlap), text, "len={len} L={max} O={overlap}");
            for chunk in &chunks[..chunks.len() - 1] {
                assert_eq!(chunk.char_count(), max);
            }
            assert!(chunks.last().unwrap().char_count() <= max);
        }
    }

    #[test]
    fn test_adjacent_chunks_share_overlap() {
        let text = sample_text(300);
        let chunks = FixedSizeChunker::new().chunk(&text, &ChunkingConfig::new(50, 12));

        for pair in chunks.windows(2) {
            let tail: String = pair[0].content.chars().skip(50 - 12).collect();
            let head: String = pair[1].content.chars().take(12).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_multibyte_text_is_split_by_chars() {
        let text = "€ü日本語".repeat(20);
        let chunks = FixedSizeChunker::new().chunk(&text, &ChunkingConfig::new(7, 2));

        assert_eq!(reassemble(&chunks, 2), text);
        assert_eq!(chunks[0].content.chars().count(), 7);
    }

    #[test]
    fn test_sentence_boundary_keeps_overlap_and_reconstruction() {
        let text = "First sentence here. Second one is a bit longer! Third? Yes, and the rest runs on without any stop at all for a while";
        let config = ChunkingConfig {
            max_chunk_chars: 40,
            overlap_chars: 5,
            prefer_sentence_boundary: true,
        };
        let chunks = FixedSizeChunker::new().chunk(text, &config);

        assert_eq!(reassemble(&chunks, 5), text);
        assert_eq!(chunks[0].content, "First sentence here.");
        for chunk in &chunks {
            assert!(chunk.char_count() <= 40);
        }
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].char_range.0, pair[0].char_range.1 - 5);
        }
    }

    #[test]
    fn test_sentence_boundary_falls_back_to_fixed_length() {
        let text = "x".repeat(100);
        let config = ChunkingConfig {
            max_chunk_chars: 30,
            overlap_chars: 10,
            prefer_sentence_boundary: true,
        };
        let chunks = FixedSizeChunker::new().chunk(&text, &config);
        assert_eq!(chunks[0].char_range, (0, 30));
        assert_eq!(chunks[1].char_range, (20, 50));
    }

    #[test]
    fn test_chunk_pages_numbers_in_page_order() {
        let pages = vec![
            Page::new(1, sample_text(120)),
            Page::new(4, ""),
            Page::new(6, sample_text(30)),
        ];
        let chunks = chunk_pages(&pages, &FixedSizeChunker::new(), &ChunkingConfig::new(50, 10));

        let ordinals: Vec<_> = chunks.iter().map(|c| c.ordinal).collect();
        let sources: Vec<_> = chunks.iter().map(|c| c.page).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
        assert_eq!(sources, vec![1, 1, 1, 6]);
    }

    #[test]
    fn test_chunk_pages_skips_blank_windows() {
        let padded = format!("text{}more", " ".repeat(1000));
        let pages = vec![Page::new(0, padded.as_str()), Page::new(1, "\n\t  \n")];
        let config = ChunkingConfig::new(100, 10);

        let raw = FixedSizeChunker::new().chunk(&padded, &config);
        assert!(raw.iter().any(|c| c.content.trim().is_empty()));

        let chunks = chunk_pages(&pages, &FixedSizeChunker::new(), &config);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| !c.text.trim().is_empty()));
        assert!(chunks.iter().all(|c| c.page == 0));
        let ordinals: Vec<_> = chunks.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1]);
    }
}
