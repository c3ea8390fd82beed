//! Bounded context assembly.

use serde::Serialize;

use crate::index::SearchHit;

pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// The context block sent to the generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Context {
    pub text: String,

    /// Ordinals of the chunks included, in rank order
    pub ordinals: Vec<usize>,

    /// True when chunks were dropped or the top chunk was cut
    pub truncated: bool,
}

/// Join ranked hits into at most `max_chars` characters.
///
/// Hits are taken in rank order while the running total (separators
/// included) fits, so the lowest-ranked chunks are the first to go. A top
/// chunk that alone exceeds the limit is cut to the limit.
pub fn assemble_context(hits: &[SearchHit], max_chars: usize) -> Context {
    let separator_len = CONTEXT_SEPARATOR.chars().count();
    let mut text = String::new();
    let mut used = 0usize;
    let mut ordinals = Vec::new();

    for hit in hits {
        let len = hit.chunk.text.chars().count();
        let extra = if ordinals.is_empty() { len } else { len + separator_len };

        if used + extra > max_chars {
            if ordinals.is_empty() && max_chars > 0 {
                text.extend(hit.chunk.text.chars().take(max_chars));
                ordinals.push(hit.chunk.ordinal);
            }
            return Context {
                text,
                ordinals,
                truncated: true,
            };
        }

        if !ordinals.is_empty() {
            text.push_str(CONTEXT_SEPARATOR);
        }
        text.push_str(&hit.chunk.text);
        used += extra;
        ordinals.push(hit.chunk.ordinal);
    }

    Context {
        text,
        ordinals,
        truncated: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chunk;

    fn hit(rank: usize, ordinal: usize, text: &str) -> SearchHit {
        SearchHit {
            rank,
            score: 1.0 - rank as f32 * 0.1,
            chunk: Chunk {
                ordinal,
                page: 0,
                char_range: (0, text.chars().count()),
                text: text.to_string(),
            },
        }
    }

    #[test]
    fn test_everything_fits() {
        let hits = [hit(0, 4, "first"), hit(1, 1, "second")];
        let context = assemble_context(&hits, 100);
        assert_eq!(context.text, "first\n\nsecond");
        assert_eq!(context.ordinals, vec![4, 1]);
        assert!(!context.truncated);
    }

    #[test]
    fn test_lowest_ranked_dropped_first() {
        let hits = [hit(0, 0, "aaaaa"), hit(1, 1, "bbbbb"), hit(2, 2, "ccccc")];
        // 5 + 2 + 5 = 12 fits, the third would need 19
        let context = assemble_context(&hits, 15);
        assert_eq!(context.text, "aaaaa\n\nbbbbb");
        assert_eq!(context.ordinals, vec![0, 1]);
        assert!(context.truncated);
        assert!(context.text.chars().count() <= 15);
    }

    #[test]
    fn test_oversized_top_chunk_is_cut() {
        let hits = [hit(0, 7, "ééééééééé"), hit(1, 8, "b")];
        let context = assemble_context(&hits, 4);
        assert_eq!(context.text, "éééé");
        assert_eq!(context.ordinals, vec![7]);
        assert!(context.truncated);
    }

    #[test]
    fn test_empty_hits() {
        let context = assemble_context(&[], 10);
        assert!(context.text.is_empty());
        assert!(context.ordinals.is_empty());
    }
}
