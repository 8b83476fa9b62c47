use thiserror::Error;

use crate::errors::AppError;
use crate::models::domain::DocumentKind;

#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    #[error("Unsupported file type")]
    UnsupportedType,

    #[error("Uploaded file is empty")]
    Empty,

    #[error("Failed to extract PDF text: {0}")]
    Pdf(String),

    #[error("File is not valid UTF-8 text")]
    NotUtf8,
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        AppError::IngestionError(err.to_string())
    }
}

/// Extracts plain text from an uploaded document. CPU-bound for PDFs, so
/// callers on the async runtime should run it on a blocking thread.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, DocumentError> {
    if bytes.is_empty() {
        return Err(DocumentError::Empty);
    }

    let text = match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| DocumentError::Pdf(e.to_string()))?,
        DocumentKind::PlainText | DocumentKind::Markdown => {
            let text = std::str::from_utf8(bytes).map_err(|_| DocumentError::NotUtf8)?;
            text.trim_start_matches('\u{feff}').to_string()
        }
    };

    if text.trim().is_empty() {
        return Err(DocumentError::Empty);
    }
    Ok(text)
}
