//! Record assembly: canonical identifiers + normalised text → record and status.
//!
//! The status reports the *raw* text length while the record carries the
//! flattened (and possibly truncated) text, so `textLength` can exceed the
//! length of `Ocr_text`.

use crate::output::{OutputRecord, StatusSummary, NO_FILE_REASON};
use crate::pipeline::extract::ExtractionResult;
use crate::pipeline::input::CanonicalInput;
use crate::pipeline::normalize::NormalizedText;

/// Build the dataset row for a decoded document.
pub fn build_record(
    input: &CanonicalInput,
    text: NormalizedText,
    extraction: &ExtractionResult,
    file_size_bytes: u64,
) -> OutputRecord {
    OutputRecord {
        ocr_text: text.flattened,
        ocr_preview: text.preview,
        ocr_text_verbatim: text.verbatim,
        has_text_layer: extraction.has_text_layer,
        file_size_bytes,
        reason: None,
        ..identifiers(input)
    }
}

/// The placeholder row appended on the no-file branch when configured.
pub fn build_no_file_record(input: &CanonicalInput) -> OutputRecord {
    OutputRecord {
        ocr_text: String::new(),
        has_text_layer: false,
        file_size_bytes: 0,
        reason: Some(NO_FILE_REASON.to_string()),
        ..identifiers(input)
    }
}

/// `ok: true` status for a processed document.
pub fn success_status(input: &CanonicalInput, extraction: &ExtractionResult) -> StatusSummary {
    StatusSummary {
        ok: true,
        reason: None,
        invoice_id: input.invoice_id.clone(),
        line_item_id: input.line_item_id.clone(),
        attachment_id: input.attachment_id.clone(),
        has_text_layer: Some(extraction.has_text_layer),
        text_length: Some(extraction.text_length()),
    }
}

/// `ok: false, reason: "NO_FILE"` status.
pub fn no_file_status(input: &CanonicalInput) -> StatusSummary {
    StatusSummary {
        ok: false,
        reason: Some(NO_FILE_REASON.to_string()),
        invoice_id: input.invoice_id.clone(),
        line_item_id: input.line_item_id.clone(),
        attachment_id: input.attachment_id.clone(),
        has_text_layer: None,
        text_length: None,
    }
}

fn identifiers(input: &CanonicalInput) -> OutputRecord {
    OutputRecord {
        invoice_id: input.invoice_id.clone(),
        line_item_id: input.line_item_id.clone(),
        attachment_id: input.attachment_id.clone(),
        master_attachment_key: input.master_attachment_key.clone(),
        file_name: input.file_name.clone(),
        path_lower: input.path_lower.clone(),
        likely_tracking_horse: input.likely_tracking_horse.clone(),
        xero_type: input.xero_type.clone(),
        xero_year: input.xero_year.clone(),
        target_type: input.target_type.clone(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CanonicalInput {
        CanonicalInput {
            file_name: "bill.pdf".into(),
            invoice_id: "INV1".into(),
            line_item_id: "L1".into(),
            attachment_id: "A1".into(),
            xero_year: "2024".into(),
            ..Default::default()
        }
    }

    #[test]
    fn record_passes_identifiers_through() {
        let extraction = ExtractionResult::from_raw("Hello\nWorld".into());
        let text = NormalizedText {
            flattened: "Hello World".into(),
            preview: Some("Hello".into()),
            verbatim: None,
        };
        let record = build_record(&input(), text, &extraction, 42);
        assert_eq!(record.invoice_id, "INV1");
        assert_eq!(record.file_name, "bill.pdf");
        assert_eq!(record.xero_year, "2024");
        assert_eq!(record.ocr_text, "Hello World");
        assert_eq!(record.ocr_preview.as_deref(), Some("Hello"));
        assert!(record.has_text_layer);
        assert_eq!(record.file_size_bytes, 42);
        assert!(record.reason.is_none());
    }

    #[test]
    fn status_reports_raw_length() {
        let extraction = ExtractionResult::from_raw("Hello\n\n\nWorld".into());
        let status = success_status(&input(), &extraction);
        assert!(status.ok);
        assert_eq!(status.text_length, Some(13));
        assert_eq!(status.has_text_layer, Some(true));
        assert_eq!(status.attachment_id, "A1");
    }

    #[test]
    fn no_file_outputs() {
        let status = no_file_status(&input());
        assert!(status.is_no_file());
        assert_eq!(status.invoice_id, "INV1");
        assert!(status.text_length.is_none());

        let record = build_no_file_record(&input());
        assert_eq!(record.reason.as_deref(), Some(NO_FILE_REASON));
        assert_eq!(record.ocr_text, "");
        assert!(!record.has_text_layer);
        assert_eq!(record.file_size_bytes, 0);
        assert_eq!(record.line_item_id, "L1");
    }
}
