//! PDF text extraction.
//!
//! Extraction runs on the blocking thread pool: `pdf_extract` parses the
//! whole document synchronously, which can take hundreds of milliseconds
//! for large files.

use thiserror::Error;

/// Documents whose extracted text trims below this length are treated as
/// unusable (scanned images, empty pages).
const MIN_EXTRACTED_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not read PDF: {0}. The file may be corrupted or image-only; try re-downloading or re-saving it")]
    Unreadable(String),
    #[error("PDF contains no extractable text; it may be a scanned document")]
    Empty,
    #[error("extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Extracts plain text from raw PDF bytes.
///
/// Returns [`ExtractError::Empty`] when the document yields fewer than
/// 100 characters of trimmed text.
pub async fn extract_pdf_bytes(bytes: Vec<u8>) -> Result<String, ExtractError> {
    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes)
    })
    .await?
    .map_err(|e| ExtractError::Unreadable(e.to_string()))?;

    if text.trim().chars().count() < MIN_EXTRACTED_CHARS {
        return Err(ExtractError::Empty);
    }
    Ok(text)
}
