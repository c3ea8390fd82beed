//! Relevance filtering of extracted pages.
//!
//! The default predicate is a keyword heuristic with no precision or recall
//! guarantee. Any `PagePredicate` can stand in for it.

use rayon::prelude::*;

use super::types::{Page, Pages};

/// Decides whether a page is worth keeping.
pub trait PagePredicate: Send + Sync {
    fn keep(&self, page: &Page) -> bool;
}

/// Keeps pages that contain at least one keyword phrase, case-insensitively.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    /// Folded (lowercase, ASCII apostrophes) phrases
    keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| fold(k.as_ref().trim()))
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True if `text` contains any keyword.
    pub fn matches(&self, text: &str) -> bool {
        let folded = fold(text);
        self.keywords.iter().any(|k| folded.contains(k.as_str()))
    }
}

impl PagePredicate for KeywordFilter {
    fn keep(&self, page: &Page) -> bool {
        self.matches(&page.text)
    }
}

/// Lowercase and map typographic apostrophes to `'`.
fn fold(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' | '\u{02BC}' => '\'',
            other => other,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Keep the pages accepted by `predicate`, in their original order.
///
/// Pages are tested in parallel on the current rayon pool. An empty result
/// means no relevant content, not an error.
pub fn filter_pages(pages: &Pages, predicate: &dyn PagePredicate) -> Pages {
    let keep: Vec<bool> = pages
        .as_slice()
        .par_iter()
        .map(|page| predicate.keep(page))
        .collect();

    pages
        .iter()
        .zip(keep)
        .filter_map(|(page, keep)| keep.then(|| page.clone()))
        .collect()
}
