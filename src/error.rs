//! Error types for the xero-ocr library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`OcrError`] is **fatal**: the invocation cannot proceed at all
//!   (malformed envelope, storage not writable, bad configuration). Returned
//!   as `Err(OcrError)` from the top-level `process*` / `run_with_storage`
//!   functions, and nothing is written to the output sinks.
//!
//! * [`ExtractionFailure`] is **non-fatal**: the text-layer reader could not
//!   make sense of the document bytes. The pipeline downgrades it to an empty
//!   extraction and still emits a record and an `ok: true` status.
//!
//! A missing document is neither: it is the expected `NO_FILE` branch and is
//! modelled as [`crate::pipeline::decode::Decoded::NoFile`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the xero-ocr library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input envelope is malformed (unparseable wrapped JSON, wrong type
    /// for a nested field, non-object envelope).
    #[error("Invalid input envelope: {reason}")]
    InvalidInput { reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Storage errors ────────────────────────────────────────────────────
    /// The input record could not be read from storage.
    #[error("Failed to read '{path}': {source}")]
    StorageReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record or status could not be written to storage.
    #[error("Failed to write '{path}': {source}")]
    StorageWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The decoded document could not be staged in a temp directory.
    #[error("Failed to stage document '{file_name}': {source}")]
    StagingFailed {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// Shorthand for [`OcrError::InvalidInput`].
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        OcrError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// `true` for errors caused by the caller's payload rather than the host.
    pub fn is_input_error(&self) -> bool {
        matches!(self, OcrError::InvalidInput { .. })
    }
}

/// A non-fatal failure of the text-layer reader.
///
/// Never propagated out of the pipeline: it is logged and replaced by an
/// empty extraction.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractionFailure {
    /// The bytes do not carry a `%PDF` header.
    #[error("document is not a PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// The reader rejected the document.
    #[error("{reader} could not read the document: {detail}")]
    ReaderError { reader: String, detail: String },

    /// The reader panicked on a corrupt stream.
    #[error("{reader} panicked: {detail}")]
    ReaderPanicked { reader: String, detail: String },

    /// The reader backend could not be initialised.
    #[error("{reader} is unavailable: {detail}")]
    ReaderUnavailable { reader: String, detail: String },

    /// The reader did not finish within the configured deadline.
    #[error("text extraction timed out after {secs}s")]
    TimedOut { secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_display() {
        let e = OcrError::invalid_input("field 'json' is not valid JSON");
        let msg = e.to_string();
        assert!(msg.contains("'json'"), "got: {msg}");
        assert!(e.is_input_error());
    }

    #[test]
    fn storage_error_is_not_input_error() {
        let e = OcrError::StorageWriteFailed {
            path: PathBuf::from("/tmp/OUTPUT.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!e.is_input_error());
        assert!(e.to_string().contains("OUTPUT.json"));
    }

    #[test]
    fn timeout_display() {
        let e = ExtractionFailure::TimedOut { secs: 30 };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn reader_error_display() {
        let e = ExtractionFailure::ReaderError {
            reader: "pdf-extract".into(),
            detail: "invalid xref".into(),
        };
        assert!(e.to_string().contains("pdf-extract"));
        assert!(e.to_string().contains("invalid xref"));
    }
}
