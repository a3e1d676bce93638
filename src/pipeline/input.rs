//! Input normalisation: unwrap the caller's envelope into one canonical field set.
//!
//! Callers have sent the same payload in three shapes over time:
//!
//! ```text
//! { "invoiceId": "INV1", "fileContentBase64": "…" }                 flat
//! { "json": "{\"invoiceId\":\"INV1\",\"fileContentBase64\":\"…\"}" }  JSON-wrapped
//! { "specification": { "invoiceId": "INV1", … } }                    nested
//! ```
//!
//! The shape is resolved exactly once, here, into [`CanonicalInput`]. Nothing
//! downstream looks at the raw envelope again.

use crate::error::OcrError;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Field holding a serialized JSON copy of the flat shape.
pub const JSON_WRAPPED_FIELD: &str = "json";

/// Field holding a nested object in the flat shape.
pub const NESTED_FIELD: &str = "specification";

/// File name used when the caller sends none.
pub const DEFAULT_FILE_NAME: &str = "file.pdf";

/// The untrusted caller payload, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEnvelope {
    /// Identifier fields at the top level.
    Flat(Map<String, Value>),
    /// The flat shape serialized into a string field.
    JsonWrapped(String),
    /// The flat shape nested under an object field.
    NestedSpecification(Value),
}

impl InputEnvelope {
    /// Classify a raw input value.
    ///
    /// `null` is an empty flat envelope. The wrapped-JSON field wins over the
    /// nested field when both are present.
    pub fn classify(input: Value) -> Result<Self, OcrError> {
        let mut map = match input {
            Value::Null => return Ok(InputEnvelope::Flat(Map::new())),
            Value::Object(map) => map,
            other => {
                return Err(OcrError::invalid_input(format!(
                    "envelope must be a JSON object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        match map.remove(JSON_WRAPPED_FIELD) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => return Ok(InputEnvelope::JsonWrapped(s)),
            Some(other) => {
                return Err(OcrError::invalid_input(format!(
                    "field '{JSON_WRAPPED_FIELD}' must be a string holding JSON, got {}",
                    json_type_name(&other)
                )))
            }
        }

        match map.remove(NESTED_FIELD) {
            None | Some(Value::Null) => Ok(InputEnvelope::Flat(map)),
            Some(nested) => Ok(InputEnvelope::NestedSpecification(nested)),
        }
    }

    /// Short name of the shape, for logging.
    pub fn shape(&self) -> &'static str {
        match self {
            InputEnvelope::Flat(_) => "flat",
            InputEnvelope::JsonWrapped(_) => "json-wrapped",
            InputEnvelope::NestedSpecification(_) => "nested-specification",
        }
    }

    /// Unwrap into the flat field map.
    pub fn into_fields(self) -> Result<Map<String, Value>, OcrError> {
        match self {
            InputEnvelope::Flat(map) => Ok(map),
            InputEnvelope::JsonWrapped(raw) => {
                let parsed: Value = serde_json::from_str(&raw).map_err(|e| {
                    OcrError::invalid_input(format!(
                        "field '{JSON_WRAPPED_FIELD}' is not valid JSON: {e}"
                    ))
                })?;
                match parsed {
                    Value::Object(map) => Ok(map),
                    other => Err(OcrError::invalid_input(format!(
                        "field '{JSON_WRAPPED_FIELD}' must decode to an object, got {}",
                        json_type_name(&other)
                    ))),
                }
            }
            InputEnvelope::NestedSpecification(Value::Object(map)) => Ok(map),
            InputEnvelope::NestedSpecification(other) => Err(OcrError::invalid_input(format!(
                "field '{NESTED_FIELD}' must be an object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

/// The canonical field set every later stage works from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalInput {
    pub file_name: String,
    /// `None` when absent, null, or blank: the `NO_FILE` branch.
    #[serde(skip_serializing)]
    pub file_content_base64: Option<String>,
    pub invoice_id: String,
    pub line_item_id: String,
    pub attachment_id: String,
    pub master_attachment_key: String,
    pub path_lower: String,
    pub likely_tracking_horse: String,
    pub xero_type: String,
    pub xero_year: String,
    pub target_type: String,
}

impl CanonicalInput {
    /// Build from an already-unwrapped field map, applying defaults and
    /// string coercion.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let text = |key: &str| coerce_to_string(fields.get(key));

        let file_name = match text("fileName") {
            name if name.is_empty() => DEFAULT_FILE_NAME.to_string(),
            name => name,
        };

        let file_content_base64 =
            Some(text("fileContentBase64")).filter(|b64| !b64.trim().is_empty());

        Self {
            file_name,
            file_content_base64,
            invoice_id: text("invoiceId"),
            line_item_id: text("lineItemId"),
            attachment_id: text("attachmentId"),
            master_attachment_key: text("masterAttachmentKey"),
            path_lower: text("pathLower"),
            likely_tracking_horse: text("likelyTrackingHorse"),
            xero_type: text("xeroType"),
            xero_year: text("xeroYear"),
            target_type: text("targetType"),
        }
    }

    /// `true` when the caller sent a document payload.
    pub fn has_file(&self) -> bool {
        self.file_content_base64.is_some()
    }
}

/// Resolve any supported envelope shape into a [`CanonicalInput`], along
/// with the name of the shape it arrived in.
pub fn normalize_input(input: Value) -> Result<(CanonicalInput, &'static str), OcrError> {
    let envelope = InputEnvelope::classify(input)?;
    let shape = envelope.shape();
    let canonical = CanonicalInput::from_fields(&envelope.into_fields()?);
    debug!(
        "Envelope shape '{}' → invoice='{}' attachment='{}' has_file={}",
        shape,
        canonical.invoice_id,
        canonical.attachment_id,
        canonical.has_file()
    );
    Ok((canonical, shape))
}

/// Null/absent → `""`; strings pass through; other values use their JSON text.
fn coerce_to_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical(input: Value) -> Result<CanonicalInput, OcrError> {
        normalize_input(input).map(|(c, _)| c)
    }

    #[test]
    fn shape_is_reported() {
        let (_, shape) = normalize_input(json!({ "specification": {} })).unwrap();
        assert_eq!(shape, "nested-specification");
        let (_, shape) = normalize_input(json!({ "json": "{}" })).unwrap();
        assert_eq!(shape, "json-wrapped");
        let (_, shape) = normalize_input(Value::Null).unwrap();
        assert_eq!(shape, "flat");
    }

    #[test]
    fn flat_shape_with_defaults() {
        let c = canonical(json!({ "invoiceId": "INV1" })).unwrap();
        assert_eq!(c.invoice_id, "INV1");
        assert_eq!(c.file_name, DEFAULT_FILE_NAME);
        assert_eq!(c.line_item_id, "");
        assert!(!c.has_file());
    }

    #[test]
    fn null_envelope_is_empty_flat() {
        let c = canonical(Value::Null).unwrap();
        assert_eq!(c, CanonicalInput::from_fields(&Map::new()));
        assert_eq!(c.file_name, DEFAULT_FILE_NAME);
    }

    #[test]
    fn json_wrapped_shape() {
        let c = canonical(json!({ "json": "{\"invoiceId\":\"INV1\",\"xeroYear\":2024}" }))
            .unwrap();
        assert_eq!(c.invoice_id, "INV1");
        assert_eq!(c.xero_year, "2024");
    }

    #[test]
    fn json_wrapped_garbage_is_invalid_input() {
        let err = canonical(json!({ "json": "not json" })).unwrap_err();
        assert!(err.is_input_error(), "got: {err}");
    }

    #[test]
    fn json_wrapped_non_object_is_invalid_input() {
        assert!(canonical(json!({ "json": "[1,2]" })).is_err());
        assert!(canonical(json!({ "json": 42 })).is_err());
    }

    #[test]
    fn nested_shape() {
        let c = canonical(json!({
            "specification": { "lineItemId": "L7", "fileName": "bill.pdf" }
        }))
        .unwrap();
        assert_eq!(c.line_item_id, "L7");
        assert_eq!(c.file_name, "bill.pdf");
    }

    #[test]
    fn nested_non_object_is_invalid_input() {
        let err = canonical(json!({ "specification": "nope" })).unwrap_err();
        assert!(err.to_string().contains("specification"));
    }

    #[test]
    fn json_wrapper_wins_over_nested() {
        let env = InputEnvelope::classify(json!({
            "json": "{}",
            "specification": { "invoiceId": "ignored" }
        }))
        .unwrap();
        assert_eq!(env.shape(), "json-wrapped");
    }

    #[test]
    fn null_wrappers_fall_through_to_flat() {
        let c = canonical(json!({
            "json": null,
            "specification": null,
            "invoiceId": "INV9"
        }))
        .unwrap();
        assert_eq!(c.invoice_id, "INV9");
    }

    #[test]
    fn non_object_envelope_rejected() {
        assert!(canonical(json!("just a string")).is_err());
        assert!(canonical(json!([1])).is_err());
    }

    #[test]
    fn scalars_coerced_to_strings() {
        let c = canonical(json!({
            "invoiceId": 12345,
            "xeroType": true,
            "pathLower": null,
            "targetType": ["a"]
        }))
        .unwrap();
        assert_eq!(c.invoice_id, "12345");
        assert_eq!(c.xero_type, "true");
        assert_eq!(c.path_lower, "");
        assert_eq!(c.target_type, "[\"a\"]");
    }

    #[test]
    fn blank_payload_is_no_file() {
        let c = canonical(json!({ "fileContentBase64": "   " })).unwrap();
        assert!(!c.has_file());
        let c = canonical(json!({ "fileContentBase64": "" })).unwrap();
        assert!(!c.has_file());
    }

    #[test]
    fn empty_file_name_defaults() {
        let c = canonical(json!({ "fileName": "" })).unwrap();
        assert_eq!(c.file_name, DEFAULT_FILE_NAME);
    }
}
