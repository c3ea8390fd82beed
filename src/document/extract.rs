//! Page-level text extraction.
//!
//! Extraction is all-or-nothing: an extractor returns every page of the
//! document or an `Extraction` error, never a partial page list.

use super::types::{Document, Page, Pages};
use crate::error::{RagError, RagResult};

const PDF_MAGIC: &[u8] = b"%PDF-";
const FORM_FEED: char = '\x0c';

/// Turns document bytes into pages.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, document: &Document) -> RagResult<Pages>;
}

/// PDF text-layer extraction, one page per PDF page.
#[derive(Debug, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, document: &Document) -> RagResult<Pages> {
        let name = document.name();
        let pdf = lopdf::Document::load_mem(document.bytes())
            .map_err(|e| RagError::extraction(name, format!("malformed PDF: {e}")))?;

        if pdf.is_encrypted() {
            return Err(RagError::extraction(name, "PDF is encrypted"));
        }

        let page_numbers: Vec<u32> = pdf.get_pages().keys().copied().collect();
        let mut pages = Vec::with_capacity(page_numbers.len());
        for (index, number) in page_numbers.into_iter().enumerate() {
            let text = pdf.extract_text(&[number]).map_err(|e| {
                RagError::extraction(name, format!("page {number} has no readable text: {e}"))
            })?;
            pages.push(Page::new(index, text));
        }

        tracing::debug!(target: "ingest", "extracted {} PDF pages from {name}", pages.len());
        Ok(Pages::new(pages))
    }
}

/// UTF-8 text with pages separated by form feeds, as `pdftotext` writes it.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, document: &Document) -> RagResult<Pages> {
        let name = document.name();
        let text = std::str::from_utf8(document.bytes())
            .map_err(|e| RagError::extraction(name, format!("not valid UTF-8 text: {e}")))?;

        if text.contains('\0') {
            return Err(RagError::extraction(name, "binary content in text document"));
        }

        let mut segments: Vec<&str> = text.split(FORM_FEED).collect();
        // pdftotext terminates the last page with a form feed too
        if segments.len() > 1 && segments.last().is_some_and(|s| s.is_empty()) {
            segments.pop();
        }

        Ok(segments
            .into_iter()
            .enumerate()
            .map(|(index, segment)| Page::new(index, segment))
            .collect())
    }
}

/// Pick an extractor from the document's magic bytes and name, then extract.
pub fn extract_pages(document: &Document) -> RagResult<Pages> {
    let bytes = document.bytes();
    if bytes.is_empty() {
        return Err(RagError::extraction(document.name(), "document is empty"));
    }

    if bytes.starts_with(PDF_MAGIC) {
        return PdfExtractor.extract(document);
    }

    if document.name().to_ascii_lowercase().ends_with(".pdf") {
        return Err(RagError::extraction(
            document.name(),
            "missing %PDF header (truncated or not a PDF)",
        ));
    }

    PlainTextExtractor.extract(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_splits_on_form_feed() {
        let doc = Document::new("filing.txt", b"cover\x0crisk factors\x0cnotes\x0c".to_vec());
        let pages = extract_pages(&doc).unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(pages.as_slice()[1].text, "risk factors");
        assert_eq!(pages.as_slice()[2].index, 2);
    }

    #[test]
    fn test_plain_text_without_form_feed_is_one_page() {
        let doc = Document::new("filing.txt", b"just one page".to_vec());
        let pages = extract_pages(&doc).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages.as_slice()[0].text, "just one page");
    }

    #[test]
    fn test_empty_document_fails() {
        let doc = Document::new("empty.txt", Vec::new());
        assert!(matches!(
            extract_pages(&doc),
            Err(RagError::Extraction { .. })
        ));
    }

    #[test]
    fn test_truncated_pdf_fails() {
        let doc = Document::new("broken.pdf", b"%PDF-1.7\n1 0 obj\n<< /Type".to_vec());
        let err = extract_pages(&doc).unwrap_err();
        assert!(matches!(err, RagError::Extraction { ref document, .. } if document == "broken.pdf"));
    }

    #[test]
    fn test_pdf_name_without_magic_fails() {
        let doc = Document::new("report.PDF", b"hello".to_vec());
        assert!(matches!(
            extract_pages(&doc),
            Err(RagError::Extraction { .. })
        ));
    }

    #[test]
    fn test_binary_content_fails() {
        let invalid_utf8 = Document::new("blob.bin", vec![0xff, 0xfe, 0x00, 0x81]);
        assert!(extract_pages(&invalid_utf8).is_err());

        let with_nul = Document::new("blob.txt", b"abc\0def".to_vec());
        assert!(extract_pages(&with_nul).is_err());
    }
}
