//! # xero-ocr
//!
//! Read the embedded text layer of a base64-encoded PDF attachment and emit it
//! as one flat, CSV-safe record plus a status summary.
//!
//! ## What it does (and does not)
//!
//! Invoice attachments pulled from an accounting system usually carry a
//! digital text layer. This crate reads that layer as-is; it never rasterises
//! pages or runs pixel OCR. Image-only scans therefore come back with
//! `Has_text_layer: false` and empty text, which is still a successful
//! invocation.
//!
//! ## Pipeline Overview
//!
//! ```text
//! envelope (JSON)
//!  │
//!  ├─ 1. Input      unwrap flat / {"json": "…"} / {"specification": {…}}
//!  ├─ 2. Decode     base64 → bytes, or the NO_FILE branch
//!  ├─ 3. Extract    text layer via pdf-extract (spawn_blocking, deadline)
//!  ├─ 4. Normalise  strip controls, flatten line breaks, collapse whitespace
//!  └─ 5. Assemble   OutputRecord + StatusSummary
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xero_ocr::{process, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let input = serde_json::json!({
//!         "invoiceId": "INV-001",
//!         "fileContentBase64": "JVBERi0xLjQK…",
//!     });
//!     let output = process(input, &ExtractionConfig::default()).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.status)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `xero-ocr` binary (clap + anyhow + tracing-subscriber) |
//! | `pdfium` | off     | Adds the `pdfium` reader backend (needs libpdfium at runtime) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod invoke;
pub mod output;
pub mod pipeline;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, NewlinePolicy, NoFilePolicy};
pub use error::{ExtractionFailure, OcrError};
pub use invoke::{process, process_json, process_sync, resolve_reader, run_with_storage, write_output};
pub use output::{InvocationOutput, InvocationStats, OutputRecord, StatusSummary, NO_FILE_REASON};
pub use pipeline::extract::{ExtractionResult, PdfExtractReader, TextLayerReader};
pub use pipeline::normalize::{flatten, NormalizedText};
pub use storage::LocalStorage;

#[cfg(feature = "pdfium")]
pub use pipeline::extract::PdfiumReader;
