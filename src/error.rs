//! Error types for the citespan library.

use std::io;
use thiserror::Error;

/// Result type alias for citespan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while ingesting documents or persisting span indexes.
///
/// Citation parsing, document resolution and highlight projection never
/// produce these: their misses are ordinary values.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading a PDF or writing an index failed at the OS level.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input bytes carry no `%PDF-` header.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version header is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// lopdf could not parse the document structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The document is encrypted and cannot be decoded.
    #[error("Document is encrypted")]
    Encrypted,

    /// A page could not be opened or its content could not be decoded.
    #[error("Page {page} is unreadable: {reason}")]
    PageUnreadable { page: u32, reason: String },

    /// A page number past the end of the document was requested.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// A span set violated the ordering/offset invariants and was rejected.
    #[error("Invalid spans for document '{document_id}' on page {page}: {reason}")]
    InvalidSpans {
        document_id: String,
        page: u32,
        reason: String,
    },

    /// Span store backend failure.
    #[error("Span store error: {0}")]
    Store(String),

    /// (De)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Segments could not be rendered.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Self {
        match err {
            sled::Error::Io(e) => Error::Io(e),
            _ => Error::Store(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Encrypted;
        assert_eq!(err.to_string(), "Document is encrypted");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );

        let err = Error::InvalidSpans {
            document_id: "doc".to_string(),
            page: 2,
            reason: "overlap".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid spans for document 'doc' on page 2: overlap"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
