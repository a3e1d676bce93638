//! Optional on-disk staging of the decoded document.
//!
//! Nothing in the pipeline reads the staged file back; it exists for hosts
//! that inspect or archive the working directory while the invocation runs.
//! The file lives in a [`TempDir`] and disappears when [`StagedDocument`] is
//! dropped, even on panic.

use crate::error::OcrError;
use crate::pipeline::decode::DocumentBytes;
use crate::pipeline::input::DEFAULT_FILE_NAME;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// A decoded document written to a temp directory.
#[derive(Debug)]
pub struct StagedDocument {
    path: PathBuf,
    _temp_dir: TempDir,
}

impl StagedDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write `document` to a fresh temp directory as `file_name`.
///
/// Only the final path component of `file_name` is used, so a caller-supplied
/// name cannot escape the temp directory.
pub async fn stage_document(
    document: &DocumentBytes,
    file_name: &str,
) -> Result<StagedDocument, OcrError> {
    let safe_name = safe_file_name(file_name);
    let staging_err = |source| OcrError::StagingFailed {
        file_name: safe_name.clone(),
        source,
    };

    let temp_dir = tempfile::Builder::new()
        .prefix("file-")
        .tempdir()
        .map_err(staging_err)?;
    let path = temp_dir.path().join(&safe_name);

    tokio::fs::write(&path, document.as_bytes())
        .await
        .map_err(staging_err)?;

    debug!("Staged {} bytes at {}", document.len(), path.display());
    Ok(StagedDocument {
        path,
        _temp_dir: temp_dir,
    })
}

fn safe_file_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_FILE_NAME)
        .to_string()
}
