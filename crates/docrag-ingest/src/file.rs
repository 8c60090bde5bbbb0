//! Text extraction from uploaded file bytes.

use std::path::Path;

use tracing::{debug, warn};

use docrag_core::{Error, Result};

/// File formats the extractor can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    PlainText,
    Pdf,
}

impl FileType {
    /// Detect file type from extension (without dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect file type from a filename's suffix.
    pub fn from_filename(filename: &str) -> Result<Self> {
        file_extension(filename)
            .and_then(|ext| Self::from_extension(&ext))
            .ok_or_else(|| Error::UnsupportedFormat(filename.to_string()))
    }
}

/// Lowercased extension of `filename`, without the dot.
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Extract raw text from a file's bytes, dispatching on `filename`.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<String> {
    match FileType::from_filename(filename)? {
        FileType::PlainText => String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Extraction(format!("{filename} is not valid UTF-8: {e}"))),
        FileType::Pdf => extract_pdf(bytes, filename),
    }
}

/// Extract text page by page. Pages without extractable text contribute
/// nothing; only an unparseable document is an error.
fn extract_pdf(bytes: &[u8], filename: &str) -> Result<String> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| Error::Extraction(format!("failed to parse PDF {filename}: {e}")))?;

    let pages = doc.get_pages();
    let mut text = String::new();
    let mut empty_pages = 0usize;

    for &page_num in pages.keys() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) if !page_text.trim().is_empty() => text.push_str(&page_text),
            Ok(_) => empty_pages += 1,
            Err(e) => {
                warn!("No text on page {} of {}: {}", page_num, filename, e);
                empty_pages += 1;
            }
        }
        text.push('\n');
    }

    debug!(
        "Extracted {} chars from {} pages of {} ({} empty)",
        text.len(),
        pages.len(),
        filename,
        empty_pages
    );
    Ok(text)
}
