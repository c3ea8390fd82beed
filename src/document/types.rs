//! Core types for filing ingestion.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an uploaded document: file name plus byte size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId {
    pub name: String,
    pub size: usize,
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.size)
    }
}

/// Raw document bytes, alive for one ingestion cycle.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a document from disk, using the file name as its name.
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn id(&self) -> DocumentId {
        DocumentId {
            name: self.name.clone(),
            size: self.bytes.len(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// One page of extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 0-based position in the document
    pub index: usize,
    pub text: String,
}

impl Page {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// 1-based page number for display.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Finite, restartable page sequence produced by an extractor.
///
/// Iterating does not consume it; every `iter()` starts from the first page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pages {
    pages: Vec<Page>,
}

impl Pages {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Page> {
        self.pages.iter()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn as_slice(&self) -> &[Page] {
        &self.pages
    }

    pub fn into_vec(self) -> Vec<Page> {
        self.pages
    }
}

impl<'a> IntoIterator for &'a Pages {
    type Item = &'a Page;
    type IntoIter = std::slice::Iter<'a, Page>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

impl FromIterator<Page> for Pages {
    fn from_iter<T: IntoIterator<Item = Page>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A bounded-length text segment, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the session's chunk sequence
    pub ordinal: usize,

    /// Source page index (0-based)
    pub page: usize,

    /// Character range (start, end) within the source page text
    pub char_range: (usize, usize),

    pub text: String,
}

impl Chunk {
    /// Length in characters.
    pub fn char_count(&self) -> usize {
        self.char_range.1 - self.char_range.0
    }

    /// Get a preview of the content (first N characters).
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((byte, _)) => &self.text[..byte],
            None => &self.text,
        }
    }
}
