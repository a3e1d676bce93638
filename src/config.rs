//! Configuration types for a single extraction invocation.
//!
//! Every externally observable policy lives in [`ExtractionConfig`], built via
//! its [`ExtractionConfigBuilder`]. Two of those policies change the literal
//! bytes a downstream consumer sees ([`NewlinePolicy`] and [`NoFilePolicy`]),
//! so they are explicit enums with documented defaults rather than booleans.

use crate::error::OcrError;
use crate::pipeline::extract::TextLayerReader;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default length of the `Ocr_preview` column, in characters.
pub const DEFAULT_PREVIEW_CHARS: usize = 250;

/// Configuration for one extraction invocation.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use xero_ocr::{ExtractionConfig, NewlinePolicy};
///
/// let config = ExtractionConfig::builder()
///     .newline_policy(NewlinePolicy::Escape)
///     .preview_chars(Some(120))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// How line breaks and tabs are rendered in the flat `Ocr_text` column.
    /// Default: [`NewlinePolicy::Space`].
    pub newline_policy: NewlinePolicy,

    /// Whether the `NO_FILE` branch also appends a placeholder record.
    /// Default: [`NoFilePolicy::StatusOnly`].
    pub no_file_policy: NoFilePolicy,

    /// Length of the `Ocr_preview` column. `None` omits the column.
    /// Default: `Some(250)`.
    pub preview_chars: Option<usize>,

    /// Emit `Ocr_text_verbatim` (line breaks kept, control characters
    /// removed). Default: false.
    pub include_verbatim: bool,

    /// Deadline for the text-layer reader in seconds. Default: 120.
    ///
    /// A reader that overruns is treated as an extraction failure, never as a
    /// failed invocation.
    pub extract_timeout_secs: u64,

    /// Write the decoded document into a temp directory under its file name
    /// for the duration of the invocation. Default: false.
    pub stage_to_disk: bool,

    /// Reader backend name (`"pdf-extract"`, or `"pdfium"` with the `pdfium`
    /// feature). If None along with `reader`, uses `pdf-extract`.
    pub reader_name: Option<String>,

    /// Pre-constructed reader. Takes precedence over `reader_name`.
    pub reader: Option<Arc<dyn TextLayerReader>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            newline_policy: NewlinePolicy::default(),
            no_file_policy: NoFilePolicy::default(),
            preview_chars: Some(DEFAULT_PREVIEW_CHARS),
            include_verbatim: false,
            extract_timeout_secs: 120,
            stage_to_disk: false,
            reader_name: None,
            reader: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("newline_policy", &self.newline_policy)
            .field("no_file_policy", &self.no_file_policy)
            .field("preview_chars", &self.preview_chars)
            .field("include_verbatim", &self.include_verbatim)
            .field("extract_timeout_secs", &self.extract_timeout_secs)
            .field("stage_to_disk", &self.stage_to_disk)
            .field("reader_name", &self.reader_name)
            .field("reader", &self.reader.as_ref().map(|r| r.name()))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn newline_policy(mut self, policy: NewlinePolicy) -> Self {
        self.config.newline_policy = policy;
        self
    }

    pub fn no_file_policy(mut self, policy: NoFilePolicy) -> Self {
        self.config.no_file_policy = policy;
        self
    }

    pub fn preview_chars(mut self, n: Option<usize>) -> Self {
        self.config.preview_chars = n;
        self
    }

    pub fn include_verbatim(mut self, v: bool) -> Self {
        self.config.include_verbatim = v;
        self
    }

    pub fn extract_timeout_secs(mut self, secs: u64) -> Self {
        self.config.extract_timeout_secs = secs;
        self
    }

    pub fn stage_to_disk(mut self, v: bool) -> Self {
        self.config.stage_to_disk = v;
        self
    }

    pub fn reader_name(mut self, name: impl Into<String>) -> Self {
        self.config.reader_name = Some(name.into());
        self
    }

    pub fn reader(mut self, reader: Arc<dyn TextLayerReader>) -> Self {
        self.config.reader = Some(reader);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, OcrError> {
        let c = &self.config;
        if c.preview_chars == Some(0) {
            return Err(OcrError::InvalidConfig(
                "Preview length must be ≥ 1 (use None to disable the preview)".into(),
            ));
        }
        if c.extract_timeout_secs == 0 {
            return Err(OcrError::InvalidConfig(
                "Extraction timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Rendering of line breaks in the flat `Ocr_text` column.
///
/// | Policy | `"Hello\nWorld"` becomes |
/// |--------|--------------------------|
/// | `Space` | `Hello World` |
/// | `Escape` | `Hello\nWorld` with a literal backslash and `n` |
///
/// `Escape` keeps line structure recoverable for consumers that unescape;
/// tab-only runs still become a single space under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NewlinePolicy {
    /// Every run of line breaks and tabs becomes one space. (default)
    #[default]
    Space,
    /// Every run containing a line break becomes the two characters `\n`.
    Escape,
}

impl NewlinePolicy {
    /// Delimiter substituted for a run that contains at least one line break.
    pub fn line_break_delimiter(self) -> &'static str {
        match self {
            NewlinePolicy::Space => " ",
            NewlinePolicy::Escape => "\\n",
        }
    }
}

/// Behaviour of the `NO_FILE` branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoFilePolicy {
    /// Only the failure status is written. (default)
    #[default]
    StatusOnly,
    /// A placeholder record with empty text, `Has_text_layer: false`,
    /// `File_size_bytes: 0` and `Reason: "NO_FILE"` is appended as well.
    PlaceholderRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ExtractionConfig::default();
        assert_eq!(c.newline_policy, NewlinePolicy::Space);
        assert_eq!(c.no_file_policy, NoFilePolicy::StatusOnly);
        assert_eq!(c.preview_chars, Some(DEFAULT_PREVIEW_CHARS));
        assert!(!c.include_verbatim);
        assert!(c.reader.is_none());
    }

    #[test]
    fn zero_preview_rejected() {
        let err = ExtractionConfig::builder()
            .preview_chars(Some(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, OcrError::InvalidConfig(_)));
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(ExtractionConfig::builder()
            .extract_timeout_secs(0)
            .build()
            .is_err());
    }

    #[test]
    fn disabled_preview_is_valid() {
        let c = ExtractionConfig::builder()
            .preview_chars(None)
            .build()
            .unwrap();
        assert_eq!(c.preview_chars, None);
    }

    #[test]
    fn policy_delimiters() {
        assert_eq!(NewlinePolicy::Space.line_break_delimiter(), " ");
        assert_eq!(NewlinePolicy::Escape.line_break_delimiter(), "\\n");
    }

    #[test]
    fn policies_serialize_kebab_case() {
        let s = serde_json::to_string(&NoFilePolicy::PlaceholderRecord).unwrap();
        assert_eq!(s, "\"placeholder-record\"");
    }
}
