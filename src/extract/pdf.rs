//! Page-by-page PDF text extraction.

use lopdf::Document;
use tracing::{debug, warn};

use crate::errors::PipelineError;
use crate::prompt::{MAX_PDF_TEXT_CHARS, truncate_with_marker};

/// A paginated document whose pages can fail independently.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Text of page `number`, counted from 1.
    ///
    /// # Errors
    ///
    /// Returns an error if this page cannot be decoded.
    fn page_text(&self, number: u32) -> Result<String, PipelineError>;
}

pub struct PdfDocument {
    doc: Document,
    pages: Vec<u32>,
}

impl PdfDocument {
    /// # Errors
    ///
    /// Returns an error if the bytes are not a readable PDF.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PipelineError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| PipelineError::Media(format!("Failed to open PDF: {e}")))?;
        let pages = doc.get_pages().keys().copied().collect();
        Ok(Self { doc, pages })
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, number: u32) -> Result<String, PipelineError> {
        self.doc
            .extract_text(&[number])
            .map_err(|e| PipelineError::Media(format!("page {number}: {e}")))
    }
}

/// Concatenate the text of every readable page with `--- Page N ---` markers.
///
/// Pages that fail or contain only whitespace are skipped.
#[must_use]
pub fn extract_pages(source: &dyn PageSource) -> String {
    let mut out = String::new();
    for number in 1..=source.page_count() {
        let Ok(number) = u32::try_from(number) else {
            break;
        };
        match source.page_text(number) {
            Ok(text) if !text.trim().is_empty() => {
                out.push_str(&format!("\n--- Page {number} ---\n{text}"));
            }
            Ok(_) => debug!("PDF page {} has no text", number),
            Err(e) => warn!("Could not extract text from PDF page {}: {}", number, e),
        }
    }
    out
}

/// Page text of a PDF, truncated to the analysis ceiling. Empty when no page
/// has text.
///
/// # Errors
///
/// Returns an error if the document itself cannot be opened.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, PipelineError> {
    let document = PdfDocument::from_bytes(bytes)?;
    let text = extract_pages(&document);
    if text.trim().is_empty() {
        return Ok(String::new());
    }
    Ok(truncate_with_marker(&text, MAX_PDF_TEXT_CHARS))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyPages {
        pages: Vec<Option<&'static str>>,
    }

    impl PageSource for FlakyPages {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&self, number: u32) -> Result<String, PipelineError> {
            self.pages[(number - 1) as usize]
                .map(str::to_string)
                .ok_or_else(|| PipelineError::Media("broken page".to_string()))
        }
    }

    #[test]
    fn failing_page_is_skipped_silently() {
        let source = FlakyPages {
            pages: vec![Some("one"), Some("two"), None, Some("four"), Some("five")],
        };
        let text = extract_pages(&source);
        assert_eq!(
            text,
            "\n--- Page 1 ---\none\n--- Page 2 ---\ntwo\n--- Page 4 ---\nfour\n--- Page 5 ---\nfive"
        );
    }

    #[test]
    fn blank_pages_leave_no_marker() {
        let source = FlakyPages {
            pages: vec![Some("  "), Some("body")],
        };
        assert_eq!(extract_pages(&source), "\n--- Page 2 ---\nbody");
    }

    #[test]
    fn garbage_bytes_are_not_a_pdf() {
        assert!(extract_pdf_text(b"definitely not a pdf").is_err());
    }
}
