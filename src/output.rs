//! Output types: the dataset record, the status summary, and per-invocation stats.
//!
//! Field names are part of the external contract. The record uses the
//! `Capitalised_snake` column names downstream spreadsheets are keyed on; the
//! status uses camelCase.

use crate::error::ExtractionFailure;
use serde::{Deserialize, Serialize};

/// `reason` written on the no-document branch.
pub const NO_FILE_REASON: &str = "NO_FILE";

/// One flat dataset row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    #[serde(rename = "Invoice_ID")]
    pub invoice_id: String,
    #[serde(rename = "Line_item_ID")]
    pub line_item_id: String,
    #[serde(rename = "Attachment_ID")]
    pub attachment_id: String,
    #[serde(rename = "Master_attachment_key")]
    pub master_attachment_key: String,
    #[serde(rename = "File_name")]
    pub file_name: String,
    #[serde(rename = "Path_lower")]
    pub path_lower: String,
    #[serde(rename = "Likely_tracking_horse")]
    pub likely_tracking_horse: String,
    #[serde(rename = "Xero_type")]
    pub xero_type: String,
    #[serde(rename = "Xero_year")]
    pub xero_year: String,
    #[serde(rename = "Target_type")]
    pub target_type: String,

    /// Flattened text; never contains a raw line break or tab.
    #[serde(rename = "Ocr_text")]
    pub ocr_text: String,
    #[serde(rename = "Ocr_preview", default, skip_serializing_if = "Option::is_none")]
    pub ocr_preview: Option<String>,
    #[serde(
        rename = "Ocr_text_verbatim",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ocr_text_verbatim: Option<String>,
    #[serde(rename = "Has_text_layer")]
    pub has_text_layer: bool,
    #[serde(rename = "File_size_bytes")]
    pub file_size_bytes: u64,
    /// Only set on the placeholder record of the no-document branch.
    #[serde(rename = "Reason", default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The terminal status written once per invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub invoice_id: String,
    pub line_item_id: String,
    pub attachment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_text_layer: Option<bool>,
    /// Character length of the raw extracted text, before normalisation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
}

impl StatusSummary {
    /// `true` when this is the no-document status.
    pub fn is_no_file(&self) -> bool {
        !self.ok && self.reason.as_deref() == Some(NO_FILE_REASON)
    }
}

/// Timing and size statistics for one invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationStats {
    /// Envelope shape that was unwrapped (`flat`, `json-wrapped`, …).
    pub envelope_shape: String,
    /// Decoded document size (0 on the no-file branch).
    pub file_size_bytes: u64,
    /// Reader backend that ran, if extraction was attempted.
    pub reader: Option<String>,
    /// Time spent in the text-layer reader.
    pub extract_duration_ms: u64,
    /// Wall-clock time for the whole invocation.
    pub total_duration_ms: u64,
}

/// Everything one invocation produces.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationOutput {
    /// The dataset row; `None` on the no-file branch unless a placeholder
    /// record was configured.
    pub record: Option<OutputRecord>,
    pub status: StatusSummary,
    /// Why extraction came back empty, when it failed. Diagnostic only.
    pub extraction_failure: Option<ExtractionFailure>,
    pub stats: InvocationStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_column_names() {
        let record = OutputRecord {
            invoice_id: "INV1".into(),
            ocr_text: "Hello World".into(),
            has_text_layer: true,
            file_size_bytes: 12,
            ..Default::default()
        };
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["Invoice_ID"], "INV1");
        assert_eq!(v["Ocr_text"], "Hello World");
        assert_eq!(v["Has_text_layer"], true);
        assert_eq!(v["File_size_bytes"], 12);
        assert!(v.get("Ocr_preview").is_none());
        assert!(v.get("Reason").is_none());
    }

    #[test]
    fn no_file_status_shape() {
        let status = StatusSummary {
            ok: false,
            reason: Some(NO_FILE_REASON.into()),
            invoice_id: "INV1".into(),
            ..Default::default()
        };
        assert!(status.is_no_file());
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({
                "ok": false,
                "reason": "NO_FILE",
                "invoiceId": "INV1",
                "lineItemId": "",
                "attachmentId": ""
            })
        );
    }

    #[test]
    fn success_status_shape() {
        let status = StatusSummary {
            ok: true,
            has_text_layer: Some(true),
            text_length: Some(11),
            ..Default::default()
        };
        let v = serde_json::to_value(&status).unwrap();
        assert_eq!(v["ok"], true);
        assert_eq!(v["hasTextLayer"], true);
        assert_eq!(v["textLength"], 11);
        assert!(v.get("reason").is_none());
        assert!(!status.is_no_file());
    }
}
