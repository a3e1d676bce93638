//! Text normalisation: raw text-layer output → flat, delimiter-safe strings.
//!
//! Extracted text is full of things a single CSV cell cannot hold: CR/LF line
//! breaks between every text run, tabs from table layouts, stray NUL and
//! form-feed bytes from broken font encodings, BOMs and zero-width joiners.
//! A consumer that splits rows on line breaks will tear such a record apart.
//!
//! ## Rule Order (flat variant)
//!
//! 1. Strip control characters (C0 except CR/LF/TAB, DEL, C1) and invisibles
//! 2. Replace each run of CR/LF/TAB with one delimiter ([`NewlinePolicy`])
//! 3. Collapse every whitespace run to a single space
//! 4. Trim
//!
//! CR, LF and TAB survive rule 1 only so that rule 2 can turn them into a
//! delimiter; stripping them outright would glue words across lines. Every
//! rule is total, and the composition is idempotent.

use crate::config::{ExtractionConfig, NewlinePolicy};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

/// The derived text variants for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedText {
    /// Single-line, CSV-safe text. Never contains CR, LF or TAB.
    pub flattened: String,
    /// `flattened` cut to the configured number of characters.
    pub preview: Option<String>,
    /// Line breaks kept (as LF), control characters removed.
    pub verbatim: Option<String>,
}

/// Produce every variant the configuration asks for.
pub fn normalize_text(raw: &str, config: &ExtractionConfig) -> NormalizedText {
    let flattened = flatten(raw, config.newline_policy);
    let preview = config
        .preview_chars
        .map(|n| preview(&flattened, n, config.newline_policy));
    let verbatim = config.include_verbatim.then(|| verbatim(raw));

    NormalizedText {
        flattened,
        preview,
        verbatim,
    }
}

/// The mandatory flat variant.
pub fn flatten(raw: &str, policy: NewlinePolicy) -> String {
    let s = strip_control_chars(raw);
    let s = replace_line_breaks(&s, policy);
    let s = collapse_whitespace(&s);
    s.trim().to_string()
}

/// Control characters removed, line breaks normalised to LF and kept.
pub fn verbatim(raw: &str) -> String {
    let s = strip_control_chars(raw);
    normalise_line_endings(&s).replace('\t', " ")
}

// ── Rule 1: Strip control and invisible characters ──────────────────────────

const INVISIBLE: [char; 6] = [
    '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
];

fn is_stripped(c: char) -> bool {
    match c {
        '\r' | '\n' | '\t' => false,
        '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}' => true,
        _ => INVISIBLE.contains(&c),
    }
}

fn strip_control_chars(input: &str) -> String {
    input.chars().filter(|&c| !is_stripped(c)).collect()
}

// ── Rule 2: Line breaks and tabs → delimiter ────────────────────────────────

static RE_BREAK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n\t]+").unwrap());

fn replace_line_breaks(input: &str, policy: NewlinePolicy) -> String {
    RE_BREAK_RUN
        .replace_all(input, |caps: &Captures<'_>| {
            if caps[0].contains(['\r', '\n']) {
                policy.line_break_delimiter()
            } else {
                " "
            }
        })
        .to_string()
}

// ── Rule 3: Collapse whitespace ─────────────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input, " ").to_string()
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

/// First `n` characters of `flattened`, never ending inside a `\n` escape.
fn preview(flattened: &str, n: usize, policy: NewlinePolicy) -> String {
    let mut cut = truncate_chars(flattened, n);
    let splits_escape = policy == NewlinePolicy::Escape
        && cut.ends_with('\\')
        && flattened[cut.len()..].starts_with('n');
    if splits_escape {
        cut.pop();
    }
    cut
}

/// First `n` characters (not bytes) of `input`.
fn truncate_chars(input: &str, n: usize) -> String {
    match input.char_indices().nth(n) {
        Some((byte_idx, _)) => input[..byte_idx].to_string(),
        None => input.to_string(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
