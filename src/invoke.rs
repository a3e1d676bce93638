//! Invocation entry points: one envelope in, one record and one status out.
//!
//! [`process`] is pure with respect to the host: it returns an
//! [`InvocationOutput`] and writes nothing. [`run_with_storage`] wraps it with
//! the host I/O (read INPUT, push the record, set OUTPUT). A fatal error
//! leaves storage untouched.

use crate::config::{ExtractionConfig, NoFilePolicy};
use crate::error::OcrError;
use crate::output::{InvocationOutput, InvocationStats};
use crate::pipeline::decode::{self, Decoded};
use crate::pipeline::extract::{self, ExtractionResult, PdfExtractReader, TextLayerReader};
use crate::pipeline::input::normalize_input;
use crate::pipeline::{assemble, normalize, stage};
use crate::storage::LocalStorage;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Process one input envelope.
///
/// # Returns
/// `Ok(InvocationOutput)` for both the success branch and the `NO_FILE`
/// branch (check `output.status.ok`). An unreadable document is still a
/// success: the record carries empty text and `Has_text_layer: false`.
///
/// # Errors
/// Returns `Err(OcrError)` only for fatal errors:
/// - Malformed envelope (`InvalidInput`)
/// - Unknown reader backend (`InvalidConfig`), once a document is present
/// - Staging failure when `stage_to_disk` is on
pub async fn process(input: Value, config: &ExtractionConfig) -> Result<InvocationOutput, OcrError> {
    info!("Invocation started");
    let result = process_inner(input, config).await;
    match &result {
        Ok(output) => info!(
            "Invocation finished: ok={} total={}ms",
            output.status.ok, output.stats.total_duration_ms
        ),
        Err(e) => error!("FATAL ERROR: {}", e),
    }
    result
}

/// Parse `input_json` and [`process`] it. Unparseable JSON is `InvalidInput`.
pub async fn process_json(
    input_json: &str,
    config: &ExtractionConfig,
) -> Result<InvocationOutput, OcrError> {
    let input: Value = serde_json::from_str(input_json)
        .map_err(|e| OcrError::invalid_input(format!("input is not valid JSON: {e}")))?;
    process(input, config).await
}

/// Synchronous wrapper around [`process`].
///
/// Creates a temporary tokio runtime internally. The runtime is shut down in
/// the background, so a reader still running past its deadline does not hold
/// up the return.
pub fn process_sync(input: Value, config: &ExtractionConfig) -> Result<InvocationOutput, OcrError> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| OcrError::Internal(format!("Failed to create tokio runtime: {}", e)))?;
    let result = rt.block_on(process(input, config));
    rt.shutdown_background();
    result
}

/// Read INPUT from `storage`, process it, push the record (if any) and set
/// the OUTPUT status.
pub async fn run_with_storage(
    storage: &LocalStorage,
    config: &ExtractionConfig,
) -> Result<InvocationOutput, OcrError> {
    let input = storage.read_input().await?;
    let output = process(input, config).await?;
    write_output(storage, &output).await?;
    Ok(output)
}

/// Persist an already-computed output: record first, then status.
pub async fn write_output(storage: &LocalStorage, output: &InvocationOutput) -> Result<(), OcrError> {
    if let Some(ref record) = output.record {
        storage.push_record(record).await?;
    }
    storage.set_status(&output.status).await?;
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn process_inner(
    input: Value,
    config: &ExtractionConfig,
) -> Result<InvocationOutput, OcrError> {
    let total_start = Instant::now();

    // ── Step 1: Unwrap the envelope ──────────────────────────────────────
    let (canonical, envelope_shape) = normalize_input(input)?;
    info!(
        "Envelope '{}': invoice='{}' line_item='{}' attachment='{}'",
        envelope_shape, canonical.invoice_id, canonical.line_item_id, canonical.attachment_id
    );

    // ── Step 2: Decode ───────────────────────────────────────────────────
    let document = match decode::decode_document(canonical.file_content_base64.as_deref()) {
        Decoded::Document(document) => document,
        Decoded::NoFile => {
            warn!("No fileContentBase64 provided, exiting");
            let record = match config.no_file_policy {
                NoFilePolicy::StatusOnly => None,
                NoFilePolicy::PlaceholderRecord => {
                    Some(assemble::build_no_file_record(&canonical))
                }
            };
            return Ok(InvocationOutput {
                record,
                status: assemble::no_file_status(&canonical),
                extraction_failure: None,
                stats: InvocationStats {
                    envelope_shape: envelope_shape.to_string(),
                    total_duration_ms: total_start.elapsed().as_millis() as u64,
                    ..Default::default()
                },
            });
        }
    };
    let file_size_bytes = document.len() as u64;
    info!("Decoded '{}': {} bytes", canonical.file_name, file_size_bytes);

    let reader = resolve_reader(config)?;

    // Held until the end of the invocation, then removed.
    let _staged = if config.stage_to_disk {
        Some(stage::stage_document(&document, &canonical.file_name).await?)
    } else {
        None
    };

    // ── Step 3: Extract (best-effort) ────────────────────────────────────
    let extract_start = Instant::now();
    let (extraction, extraction_failure) =
        match extract::extract_text(Arc::clone(&reader), document, config.extract_timeout_secs)
            .await
        {
            Ok(result) => (result, None),
            Err(failure) => {
                warn!("Text extraction failed, continuing without text: {}", failure);
                (ExtractionResult::empty(), Some(failure))
            }
        };
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    info!(
        "Extracted {} chars via {} in {}ms (text layer: {})",
        extraction.text_length(),
        reader.name(),
        extract_duration_ms,
        extraction.has_text_layer
    );

    // ── Step 4: Normalise ────────────────────────────────────────────────
    let text = normalize::normalize_text(&extraction.raw_text, config);
    debug!(
        "Normalised text: {} chars flat ({:?} policy)",
        text.flattened.chars().count(),
        config.newline_policy
    );

    // ── Step 5: Assemble ─────────────────────────────────────────────────
    let status = assemble::success_status(&canonical, &extraction);
    let record = assemble::build_record(&canonical, text, &extraction, file_size_bytes);

    Ok(InvocationOutput {
        record: Some(record),
        status,
        extraction_failure,
        stats: InvocationStats {
            envelope_shape: envelope_shape.to_string(),
            file_size_bytes,
            reader: Some(reader.name().to_string()),
            extract_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        },
    })
}

/// Resolve the reader backend, most specific first: a pre-built reader, then
/// a named backend, then `pdf-extract`.
pub fn resolve_reader(config: &ExtractionConfig) -> Result<Arc<dyn TextLayerReader>, OcrError> {
    if let Some(ref reader) = config.reader {
        return Ok(Arc::clone(reader));
    }

    match config.reader_name.as_deref() {
        None | Some("pdf-extract") => Ok(Arc::new(PdfExtractReader)),
        #[cfg(feature = "pdfium")]
        Some("pdfium") => Ok(Arc::new(extract::PdfiumReader)),
        #[cfg(not(feature = "pdfium"))]
        Some("pdfium") => Err(OcrError::InvalidConfig(
            "reader 'pdfium' requires the `pdfium` feature".into(),
        )),
        Some(other) => Err(OcrError::InvalidConfig(format!(
            "unknown reader '{other}' (expected 'pdf-extract' or 'pdfium')"
        ))),
    }
}
