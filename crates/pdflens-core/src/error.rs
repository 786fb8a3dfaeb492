//! Error types for the pdflens-core library.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Main error type for the pdflens library.
///
/// Only request-level failures live here. Problems with a single page or a
/// single image are reported as [`crate::models::document::Warning`]s.
#[derive(Error, Debug)]
pub enum PdflensError {
    /// The request itself is malformed or ambiguous.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The PDF could not be located or downloaded.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// The input is not a decodable PDF.
    #[error("decode error: {0}")]
    Decode(#[from] PdfError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    SourceError,
    DecodeError,
}

impl PdflensError {
    /// Category of this error for the response envelope.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdflensError::InvalidArgument(_) | PdflensError::Config(_) => ErrorKind::InvalidArgument,
            PdflensError::Source(_) | PdflensError::Io(_) => ErrorKind::SourceError,
            PdflensError::Decode(PdfError::Read(_)) => ErrorKind::SourceError,
            PdflensError::Decode(_) => ErrorKind::DecodeError,
        }
    }
}

/// Errors raised while resolving a request's PDF source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Local file does not exist or is not a regular file.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Local file exists but cannot be opened.
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Remote download failed (status, connection, timeout or size limit).
    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    /// Temporary file could not be created or written.
    #[error("temporary file error: {0}")]
    TempFile(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// The file could not be read from disk.
    #[error("failed to read PDF: {0}")]
    Read(std::io::Error),

    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The OCR engine is not installed or failed to load.
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine has no data for the requested language.
    #[error("unsupported OCR language: {0}")]
    UnsupportedLanguage(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// I/O error while staging the image for the engine.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to vision captioning.
#[derive(Error, Debug)]
pub enum CaptionError {
    /// No vision model is configured.
    #[error("vision model not configured")]
    NotConfigured,

    /// The request to the model failed.
    #[error("vision model request failed: {0}")]
    Request(String),

    /// The model answered with something unusable.
    #[error("invalid vision model response: {0}")]
    Response(String),

    /// The model produced an empty caption.
    #[error("vision model returned an empty caption")]
    Empty,
}

/// Result type for the pdflens library.
pub type Result<T> = std::result::Result<T, PdflensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            PdflensError::InvalidArgument("x".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            PdflensError::from(SourceError::FileNotFound(PathBuf::from("a.pdf"))).kind(),
            ErrorKind::SourceError
        );
        assert_eq!(
            PdflensError::from(PdfError::Encrypted).kind(),
            ErrorKind::DecodeError
        );
    }

    #[test]
    fn test_error_display() {
        let err = SourceError::Download {
            url: "https://example.com/a.pdf".to_string(),
            reason: "HTTP 404 Not Found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to download https://example.com/a.pdf: HTTP 404 Not Found"
        );
        assert_eq!(CaptionError::NotConfigured.to_string(), "vision model not configured");
    }
}
