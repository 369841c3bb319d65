//! PDF page text extraction

use crate::error::{Error, Result};

/// Ligatures and typographic characters that PDF fonts commonly emit
const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{00A0}', " "),
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{2013}', "-"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
];

/// Normalize extracted page text: expand ligatures, drop NULs, trim lines, drop blank lines
pub fn clean_page_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => cleaned.push_str(to),
            None if c == '\0' => {}
            None => cleaned.push(c),
        }
    }

    cleaned
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extracts per-page text from PDF bytes
pub struct PdfParser;

impl PdfParser {
    /// Parse a PDF into one text entry per page (0-based order)
    ///
    /// Pages are read with lopdf. When lopdf loads the file but finds no text
    /// on any page, pdf-extract is tried on the whole document and its output
    /// is split on form feeds.
    pub fn parse_pages(filename: &str, data: &[u8]) -> Result<Vec<String>> {
        if !data.starts_with(b"%PDF") {
            return Err(Error::page_parse(filename, "missing %PDF header"));
        }

        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::page_parse(filename, format!("Failed to load PDF: {}", e)))?;

        if doc.is_encrypted() {
            return Err(Error::page_parse(filename, "PDF is encrypted"));
        }

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(Error::page_parse(filename, "PDF has no pages"));
        }

        let mut pages = Vec::with_capacity(page_numbers.len());
        for number in &page_numbers {
            match doc.extract_text(&[*number]) {
                Ok(text) => pages.push(clean_page_text(&text)),
                Err(e) => {
                    tracing::debug!("{}: no text on page {}: {}", filename, number, e);
                    pages.push(String::new());
                }
            }
        }

        if pages.iter().all(|p| p.is_empty()) {
            tracing::debug!("{}: lopdf found no text, trying pdf-extract", filename);
            if let Some(fallback) = Self::extract_fallback(filename, data) {
                return Ok(fallback);
            }
        }

        Ok(pages)
    }

    /// Whole-document extraction with pdf-extract
    fn extract_fallback(filename: &str, data: &[u8]) -> Option<Vec<String>> {
        match pdf_extract::extract_text_from_mem(data) {
            Ok(text) => {
                let pages: Vec<String> = text.split('\u{c}').map(clean_page_text).collect();
                if pages.iter().all(|p| p.is_empty()) {
                    tracing::warn!(
                        "{}: no extractable text, the PDF may be image-based",
                        filename
                    );
                    None
                } else {
                    Some(pages)
                }
            }
            Err(e) => {
                tracing::warn!("{}: pdf-extract failed: {}", filename, e);
                None
            }
        }
    }
}
