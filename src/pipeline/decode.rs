//! Document decoding: base64 text → owned [`DocumentBytes`].
//!
//! Upstream tools differ in how they emit base64: some wrap lines at 76
//! columns, some drop the `=` padding, some use the URL-safe alphabet, some
//! send a `data:` URL. Decoding never fails. Symbols of both alphabets are
//! accepted (mixed freely), everything else is skipped, and decoding stops at
//! the first `=`. Whatever bytes come out go on to extraction, which reports
//! non-PDF bytes as a non-fatal failure.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use std::sync::Arc;
use tracing::{debug, warn};

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Raw document bytes for one invocation. Immutable; cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBytes(Arc<[u8]>);

impl DocumentBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of the decode stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// No payload was supplied: the expected `NO_FILE` branch.
    NoFile,
    /// The decoded document.
    Document(DocumentBytes),
}

/// Decode the canonical `fileContentBase64` field.
///
/// `None` or a blank string is [`Decoded::NoFile`]. Any other value yields a
/// document, possibly empty or garbage.
pub fn decode_document(file_content_base64: Option<&str>) -> Decoded {
    let Some(raw) = file_content_base64.filter(|s| !s.trim().is_empty()) else {
        return Decoded::NoFile;
    };

    let payload = strip_data_url(raw.trim_start());
    let symbols = standard_symbols(payload);
    let skipped = payload.chars().take_while(|&c| c != '=').count() - symbols.len();
    if skipped > 0 {
        debug!("Skipped {} non-base64 characters", skipped);
    }

    let bytes = STANDARD_LENIENT
        .decode(symbols.as_bytes())
        .unwrap_or_else(|e| {
            warn!("fileContentBase64 did not decode, continuing with no bytes: {}", e);
            Vec::new()
        });

    debug!("Decoded {} base64 chars → {} bytes", symbols.len(), bytes.len());
    Decoded::Document(DocumentBytes::new(bytes))
}

/// The part after the comma of a `data:…;base64,` URL, else `raw`.
fn strip_data_url(raw: &str) -> &str {
    let is_data_url = raw
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"));
    match raw.split_once(',') {
        Some((_, payload)) if is_data_url => payload,
        _ => raw,
    }
}

/// Base64 symbols up to the first `=`, in the standard alphabet.
///
/// URL-safe `-` and `_` map to `+` and `/`; any other non-alphabet character
/// is dropped. A lone trailing symbol carries fewer than 8 bits and is
/// dropped too.
fn standard_symbols(payload: &str) -> String {
    let mut symbols: String = payload
        .chars()
        .take_while(|&c| c != '=')
        .filter_map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '+' | '/' => Some(c),
            '-' => Some('+'),
            '_' => Some('/'),
            _ => None,
        })
        .collect();
    if symbols.len() % 4 == 1 {
        symbols.pop();
    }
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD};

    fn document(decoded: Decoded) -> DocumentBytes {
        match decoded {
            Decoded::Document(doc) => doc,
            Decoded::NoFile => panic!("expected a document"),
        }
    }

    #[test]
    fn absent_or_blank_is_no_file() {
        assert_eq!(decode_document(None), Decoded::NoFile);
        assert_eq!(decode_document(Some("")), Decoded::NoFile);
        assert_eq!(decode_document(Some(" \n ")), Decoded::NoFile);
    }

    #[test]
    fn padded_standard() {
        let payload = b"%PDF-1.4 hello";
        let doc = document(decode_document(Some(&STANDARD.encode(payload))));
        assert_eq!(doc.as_bytes(), payload);
        assert_eq!(doc.len(), payload.len());
    }

    #[test]
    fn unpadded_standard() {
        let payload = b"%PDF-1.7\x00\xff";
        let doc = document(decode_document(Some(&STANDARD_NO_PAD.encode(payload))));
        assert_eq!(doc.as_bytes(), payload);
    }

    #[test]
    fn url_safe_alphabet() {
        let payload = [0xfb_u8, 0xff, 0xbf, 0x3e];
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        assert!(encoded.contains(['-', '_']));
        let doc = document(decode_document(Some(&encoded)));
        assert_eq!(doc.as_bytes(), payload);
    }

    #[test]
    fn line_wrapped_input() {
        let payload = vec![7u8; 200];
        let encoded = STANDARD.encode(&payload);
        let wrapped: String = encoded
            .as_bytes()
            .chunks(76)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n");
        let doc = document(decode_document(Some(&wrapped)));
        assert_eq!(doc.len(), 200);
    }

    #[test]
    fn decoding_is_deterministic() {
        let encoded = STANDARD.encode(b"same bytes");
        let a = decode_document(Some(&encoded));
        let b = decode_document(Some(&encoded));
        assert_eq!(a, b);
    }

    #[test]
    fn foreign_characters_are_skipped() {
        let doc = document(decode_document(Some("QU*JD%")));
        assert_eq!(doc.as_bytes(), b"ABC");
        let doc = document(decode_document(Some("@@@@")));
        assert!(doc.is_empty());
    }

    #[test]
    fn mixed_alphabets() {
        let mixed = document(decode_document(Some("JVBE+i0x-jQK")));
        let standard = STANDARD.decode("JVBE+i0x+jQK").unwrap();
        assert_eq!(mixed.as_bytes(), standard.as_slice());
    }

    #[test]
    fn data_url_prefix_is_removed() {
        let payload = b"%PDF-1.4\n%%EOF";
        let url = format!("data:application/pdf;base64,{}", STANDARD.encode(payload));
        let doc = document(decode_document(Some(&url)));
        assert_eq!(doc.as_bytes(), payload);
    }

    #[test]
    fn decoding_stops_at_padding() {
        let doc = document(decode_document(Some("YQ==YWJj")));
        assert_eq!(doc.as_bytes(), b"a");
    }

    #[test]
    fn dangling_symbol_is_dropped() {
        let doc = document(decode_document(Some("QUJDR")));
        assert_eq!(doc.as_bytes(), b"ABC");
    }
}
