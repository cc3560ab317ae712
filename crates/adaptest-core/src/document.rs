//! Plain-text extraction from uploaded study material.

use std::path::Path;

use crate::error::ExtractError;

/// Supported document encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
}

impl DocumentKind {
    /// Guess the kind from the file extension, falling back to magic bytes.
    pub fn detect(path: Option<&Path>, bytes: &[u8]) -> Self {
        let is_pdf_ext = path
            .and_then(|p| p.extension())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf_ext || bytes.starts_with(b"%PDF") {
            DocumentKind::Pdf
        } else {
            DocumentKind::PlainText
        }
    }
}

/// Turn raw document bytes into trimmed plain text.
pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractError> {
    if bytes.is_empty() {
        return Err(ExtractError::Empty);
    }

    let text = match kind {
        DocumentKind::PlainText => String::from_utf8(bytes.to_vec())?,
        DocumentKind::Pdf => extract_pdf(bytes)?,
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::NoText);
    }
    Ok(trimmed.to_string())
}

#[cfg(feature = "pdf")]
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_bytes: &[u8]) -> Result<String, ExtractError> {
    Err(ExtractError::UnsupportedFormat(
        "PDF support is disabled; rebuild with the `pdf` feature".into(),
    ))
}

/// Read a document from disk and extract its text.
pub fn load_document(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    let kind = DocumentKind::detect(Some(path), &bytes);
    tracing::debug!(path = %path.display(), ?kind, bytes = bytes.len(), "loading document");
    extract_text(&bytes, kind)
}
