//! PDF text extraction

use lopdf::Document;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::PageText;

/// Normalize characters that PDF fonts commonly emit as ligatures or typographic variants
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{00A0}', " ") // Non-breaking space -> space
        .replace('\u{2018}', "'") // Left single quote -> apostrophe
        .replace('\u{2019}', "'") // Right single quote -> apostrophe
        .replace('\u{201C}', "\"") // Left double quote -> quote
        .replace('\u{201D}', "\"") // Right double quote -> quote
        .replace('\u{FB01}', "fi") // fi ligature -> separate chars
        .replace('\u{FB02}', "fl") // fl ligature -> separate chars
        .replace('\u{FB00}', "ff") // ff ligature -> separate chars
        .replace('\u{FB03}', "ffi") // ffi ligature -> separate chars
        .replace('\u{FB04}', "ffl") // ffl ligature -> separate chars
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Page-ordered text extraction backed by lopdf
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Read and parse a PDF.
    ///
    /// Unreadable paths surface as `Error::Io`, malformed documents as `Error::FileParse`.
    pub fn load(path: &Path) -> Result<Document> {
        let data = std::fs::read(path)?;
        Document::load_mem(&data).map_err(|e| {
            Error::file_parse(display_name(path), format!("Failed to load PDF: {}", e))
        })
    }

    /// Concatenated text of every page in order
    pub fn extract_text(path: &Path) -> Result<String> {
        let doc = Self::load(path)?;
        Ok(Self::text_from_document(&doc))
    }

    /// Concatenated text of an already loaded document
    pub fn text_from_document(doc: &Document) -> String {
        Self::extract_pages(doc)
            .into_iter()
            .map(|page| page.content)
            .collect()
    }

    /// Text for every page, in page order
    pub fn extract_pages(doc: &Document) -> Vec<PageText> {
        doc.get_pages()
            .into_keys()
            .map(|page_number| PageText {
                page_number,
                content: Self::page_text(doc, page_number),
            })
            .collect()
    }

    /// Text of one page; empty when the page has no extractable text
    pub fn page_text(doc: &Document, page_number: u32) -> String {
        match doc.extract_text(&[page_number]) {
            Ok(text) => cleanup_pdf_text(&text),
            Err(e) => {
                tracing::debug!("No extractable text on page {}: {}", page_number, e);
                String::new()
            }
        }
    }
}
