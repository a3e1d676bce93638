//! Text-layer extraction: [`DocumentBytes`] → [`ExtractionResult`].
//!
//! ## Why spawn_blocking?
//!
//! Both reader backends parse the whole document synchronously, and a large or
//! pathological file can keep a thread busy for seconds. Running the reader on
//! the blocking pool keeps the async runtime responsive and lets us put a
//! deadline on it with `tokio::time::timeout`. A reader panic surfaces as a
//! `JoinError` instead of unwinding through the pipeline.
//!
//! ## Failure contract
//!
//! [`extract_text`] returns `Result<ExtractionResult, ExtractionFailure>` so
//! the failure is visible in the type. The caller is expected to downgrade an
//! `Err` to [`ExtractionResult::empty`]; extraction never fails an invocation.

use crate::error::ExtractionFailure;
use crate::pipeline::decode::DocumentBytes;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The PDF header may be preceded by junk, but only within the first 1 KiB.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// A backend able to read the embedded text layer of a PDF.
///
/// Implementations must be `Send + Sync`: the reader is moved onto the
/// blocking thread pool for every invocation.
pub trait TextLayerReader: Send + Sync {
    /// Backend name, used in logs and failure details.
    fn name(&self) -> &'static str;

    /// Read the concatenated text of every page.
    fn read_text(&self, document: &[u8]) -> Result<String, ExtractionFailure>;
}

/// Pure-Rust reader backed by the `pdf-extract` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractReader;

impl TextLayerReader for PdfExtractReader {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn read_text(&self, document: &[u8]) -> Result<String, ExtractionFailure> {
        pdf_extract::extract_text_from_mem(document).map_err(|e| ExtractionFailure::ReaderError {
            reader: self.name().to_string(),
            detail: e.to_string(),
        })
    }
}

/// Reader backed by the pdfium C++ library.
///
/// The library is bound on every call, from `PDFIUM_LIB_PATH` (a file or the
/// directory holding it) or else the system library search path.
#[cfg(feature = "pdfium")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumReader;

#[cfg(feature = "pdfium")]
impl TextLayerReader for PdfiumReader {
    fn name(&self) -> &'static str {
        "pdfium"
    }

    fn read_text(&self, document: &[u8]) -> Result<String, ExtractionFailure> {
        use pdfium_render::prelude::*;
        use std::path::Path;

        let bindings = match std::env::var("PDFIUM_LIB_PATH") {
            Ok(path) if Path::new(&path).is_file() => Pdfium::bind_to_library(&path),
            Ok(dir) if !dir.is_empty() => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            }
            _ => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ExtractionFailure::ReaderUnavailable {
            reader: self.name().to_string(),
            detail: format!("{:?}", e),
        })?;

        let pdfium = Pdfium::new(bindings);
        let doc = pdfium
            .load_pdf_from_byte_slice(document, None)
            .map_err(|e| ExtractionFailure::ReaderError {
                reader: self.name().to_string(),
                detail: format!("{:?}", e),
            })?;

        let mut text = String::new();
        for page in doc.pages().iter() {
            let page_text = page.text().map_err(|e| ExtractionFailure::ReaderError {
                reader: self.name().to_string(),
                detail: format!("{:?}", e),
            })?;
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&page_text.all());
        }
        Ok(text)
    }
}

/// Raw text read from the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub raw_text: String,
    /// Always derived from `raw_text`, never taken from the reader.
    pub has_text_layer: bool,
}

impl ExtractionResult {
    pub fn from_raw(raw_text: String) -> Self {
        let has_text_layer = !raw_text.trim().is_empty();
        Self {
            raw_text,
            has_text_layer,
        }
    }

    /// The result used when extraction failed.
    pub fn empty() -> Self {
        Self::from_raw(String::new())
    }

    /// Length of the raw text in UTF-16 code units, the unit downstream
    /// consumers of the status count in.
    pub fn text_length(&self) -> usize {
        self.raw_text.encode_utf16().count()
    }
}

/// `true` if `%PDF` occurs within the first KiB.
pub fn has_pdf_header(document: &[u8]) -> bool {
    let window = &document[..document.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(4).any(|w| w == b"%PDF")
}

/// Run the reader over the document on the blocking pool, bounded by
/// `timeout_secs`.
pub async fn extract_text(
    reader: Arc<dyn TextLayerReader>,
    document: DocumentBytes,
    timeout_secs: u64,
) -> Result<ExtractionResult, ExtractionFailure> {
    if !has_pdf_header(document.as_bytes()) {
        let magic = document.as_bytes().iter().take(4).copied().collect();
        return Err(ExtractionFailure::NotAPdf { magic });
    }

    let reader_name = reader.name();
    let task = tokio::task::spawn_blocking(move || reader.read_text(document.as_bytes()));

    let raw_text = match tokio::time::timeout(Duration::from_secs(timeout_secs), task).await {
        Err(_) => return Err(ExtractionFailure::TimedOut { secs: timeout_secs }),
        Ok(Err(join_err)) => {
            return Err(ExtractionFailure::ReaderPanicked {
                reader: reader_name.to_string(),
                detail: join_err.to_string(),
            })
        }
        Ok(Ok(read)) => read?,
    };

    debug!("{} read {} chars", reader_name, raw_text.chars().count());
    Ok(ExtractionResult::from_raw(raw_text))
}
