//! Text extraction from web pages and PDF documents

pub mod pdf;
pub mod web;

pub use pdf::{PageSource, PdfDocument, extract_pages, extract_pdf_text};
pub use web::{ArticleExtractor, ExtractionChain, ExtractionStrategy, GenericScraper};
