//! CLI binary for xero-ocr.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs one invocation and writes the result to local
//! storage.

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use xero_ocr::{
    process, write_output, ExtractionConfig, LocalStorage, NewlinePolicy, NoFilePolicy,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process storage/key_value_stores/default/INPUT.json
  xero-ocr

  # Process an envelope file, print the outcome as JSON, write nothing
  xero-ocr --input envelope.json --dry-run --json

  # Read the envelope from stdin, keep line breaks as a literal \n
  cat envelope.json | xero-ocr --input - --newline escape

  # Also append a placeholder record when no file was sent
  xero-ocr --no-file-record

ENVELOPE SHAPES:
  {"invoiceId": "…", "fileContentBase64": "…"}            flat
  {"json": "{\"invoiceId\": \"…\", …}"}                   JSON-wrapped
  {"specification": {"invoiceId": "…", …}}                nested

STORAGE LAYOUT:
  <storage>/key_value_stores/default/INPUT.json   input envelope
  <storage>/key_value_stores/default/OUTPUT.json  status summary
  <storage>/datasets/default/000000001.json       output records

ENVIRONMENT VARIABLES:
  XERO_OCR_STORAGE_DIR    Storage root (default: ./storage)
  PDFIUM_LIB_PATH         libpdfium location for --reader pdfium
  RUST_LOG                Overrides the log filter
"#;

/// Extract the text layer of a base64-encoded PDF into a flat record.
#[derive(Parser, Debug)]
#[command(
    name = "xero-ocr",
    version,
    about = "Extract the text layer of a base64-encoded PDF into a flat, CSV-safe record",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Envelope JSON file, or `-` for stdin. Default: INPUT from storage.
    #[arg(short, long, env = "XERO_OCR_INPUT")]
    input: Option<PathBuf>,

    /// Storage root for INPUT, OUTPUT and the dataset.
    #[arg(long, env = "XERO_OCR_STORAGE_DIR", default_value = "storage")]
    storage_dir: PathBuf,

    /// Line-break rendering in Ocr_text: space or escape.
    #[arg(long, env = "XERO_OCR_NEWLINE", value_enum, default_value = "space")]
    newline: NewlineArg,

    /// Length of the Ocr_preview column in characters.
    #[arg(long, env = "XERO_OCR_PREVIEW_CHARS", default_value_t = 250,
          value_parser = clap::value_parser!(u64).range(1..))]
    preview_chars: u64,

    /// Omit the Ocr_preview column.
    #[arg(long, env = "XERO_OCR_NO_PREVIEW")]
    no_preview: bool,

    /// Add the Ocr_text_verbatim column (line breaks kept).
    #[arg(long, env = "XERO_OCR_VERBATIM")]
    verbatim: bool,

    /// Append a placeholder record when no file was sent.
    #[arg(long, env = "XERO_OCR_NO_FILE_RECORD")]
    no_file_record: bool,

    /// Text-layer reader: pdf-extract or pdfium.
    #[arg(long, env = "XERO_OCR_READER", default_value = "pdf-extract")]
    reader: String,

    /// Stage the decoded PDF in a temp directory while processing.
    #[arg(long, env = "XERO_OCR_STAGE_TO_DISK")]
    stage_to_disk: bool,

    /// Text extraction deadline in seconds.
    #[arg(long, env = "XERO_OCR_EXTRACT_TIMEOUT", default_value_t = 120,
          value_parser = clap::value_parser!(u64).range(1..))]
    extract_timeout: u64,

    /// Print the full invocation output as JSON on stdout.
    #[arg(long, env = "XERO_OCR_JSON")]
    json: bool,

    /// Do not write to storage.
    #[arg(long)]
    dry_run: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "XERO_OCR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "XERO_OCR_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum NewlineArg {
    Space,
    Escape,
}

impl From<NewlineArg> for NewlinePolicy {
    fn from(v: NewlineArg) -> Self {
        match v {
            NewlineArg::Space => NewlinePolicy::Space,
            NewlineArg::Escape => NewlinePolicy::Escape,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let result = runtime.block_on(run(cli));
    // A reader past its deadline may still occupy a blocking thread.
    runtime.shutdown_background();
    result
}

async fn run(cli: Cli) -> Result<()> {
    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let storage = LocalStorage::new(&cli.storage_dir);

    // ── Read input ───────────────────────────────────────────────────────
    let input = match cli.input {
        Some(ref path) => read_envelope(path).await?,
        None => storage
            .read_input()
            .await
            .with_context(|| format!("Failed to read input from {}", storage.root().display()))?,
    };

    // ── Run ──────────────────────────────────────────────────────────────
    let output = process(input, &config).await.context("Invocation failed")?;

    if !cli.dry_run {
        write_output(&storage, &output)
            .await
            .context("Failed to write output")?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    if !cli.quiet {
        let status = &output.status;
        let headline = if status.ok {
            format!(
                "{} {} chars extracted (text layer: {})",
                green("✔"),
                status.text_length.unwrap_or(0),
                status.has_text_layer.unwrap_or(false)
            )
        } else {
            format!(
                "{} {}",
                cyan("⚠"),
                status.reason.as_deref().unwrap_or("not ok")
            )
        };
        eprintln!("{headline}");
        eprintln!(
            "   {}",
            dim(&format!(
                "invoice={} attachment={} {} bytes {}ms",
                status.invoice_id,
                status.attachment_id,
                output.stats.file_size_bytes,
                output.stats.total_duration_ms
            ))
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let preview = (!cli.no_preview).then_some(cli.preview_chars as usize);
    let no_file_policy = if cli.no_file_record {
        NoFilePolicy::PlaceholderRecord
    } else {
        NoFilePolicy::StatusOnly
    };

    ExtractionConfig::builder()
        .newline_policy(cli.newline.clone().into())
        .no_file_policy(no_file_policy)
        .preview_chars(preview)
        .include_verbatim(cli.verbatim)
        .reader_name(cli.reader.clone())
        .stage_to_disk(cli.stage_to_disk)
        .extract_timeout_secs(cli.extract_timeout)
        .build()
        .context("Invalid configuration")
}

/// Read an envelope from a file, or stdin when `path` is `-`.
async fn read_envelope(path: &Path) -> Result<Value> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read envelope from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read envelope from {:?}", path))?
    };

    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&raw).with_context(|| format!("Envelope {:?} is not valid JSON", path))
}
