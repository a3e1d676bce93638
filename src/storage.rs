//! Local host storage: input, dataset and key-value store on the file system.
//!
//! Layout under the storage root:
//!
//! ```text
//! storage/
//!  ├─ key_value_stores/default/INPUT.json    envelope (read once)
//!  ├─ key_value_stores/default/OUTPUT.json   status (overwritten once)
//!  └─ datasets/default/000000001.json        records (append-only)
//! ```
//!
//! Every write goes to a `.tmp` sibling first and is renamed into place, so a
//! reader never observes a half-written file.

use crate::error::OcrError;
use crate::output::{OutputRecord, StatusSummary};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Key of the input record in the default key-value store.
pub const INPUT_KEY: &str = "INPUT";
/// Key of the status record in the default key-value store.
pub const OUTPUT_KEY: &str = "OUTPUT";

/// File-system storage rooted at one directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_value_store(&self) -> PathBuf {
        self.root.join("key_value_stores").join("default")
    }

    fn dataset_dir(&self) -> PathBuf {
        self.root.join("datasets").join("default")
    }

    pub fn input_path(&self) -> PathBuf {
        self.key_value_store().join(format!("{INPUT_KEY}.json"))
    }

    pub fn status_path(&self) -> PathBuf {
        self.key_value_store().join(format!("{OUTPUT_KEY}.json"))
    }

    /// Read the input envelope. A missing INPUT record reads as `null`.
    pub async fn read_input(&self) -> Result<Value, OcrError> {
        let path = self.input_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No input record at {}", path.display());
                return Ok(Value::Null);
            }
            Err(source) => return Err(OcrError::StorageReadFailed { path, source }),
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            OcrError::invalid_input(format!("{} is not valid JSON: {e}", path.display()))
        })
    }

    /// Store an input envelope, replacing any previous one.
    pub async fn write_input(&self, input: &Value) -> Result<PathBuf, OcrError> {
        let path = self.input_path();
        write_json_atomic(&path, input).await?;
        Ok(path)
    }

    /// Append one record to the default dataset.
    pub async fn push_record(&self, record: &OutputRecord) -> Result<PathBuf, OcrError> {
        let dir = self.dataset_dir();
        let next = self.last_record_index().await? + 1;
        let path = dir.join(format!("{next:09}.json"));
        write_json_atomic(&path, record).await?;
        info!("Pushed record {} to {}", next, dir.display());
        Ok(path)
    }

    /// Overwrite the status record.
    pub async fn set_status(&self, status: &StatusSummary) -> Result<PathBuf, OcrError> {
        let path = self.status_path();
        write_json_atomic(&path, status).await?;
        info!("Status written (ok={}) to {}", status.ok, path.display());
        Ok(path)
    }

    /// The current status record, if one has been written.
    pub async fn status(&self) -> Result<Option<StatusSummary>, OcrError> {
        read_json_opt(&self.status_path()).await
    }

    /// All records in the default dataset, in append order.
    pub async fn records(&self) -> Result<Vec<OutputRecord>, OcrError> {
        let dir = self.dataset_dir();
        let mut indices = record_indices(&dir).await?;
        indices.sort_unstable();

        let mut records = Vec::with_capacity(indices.len());
        for idx in indices {
            if let Some(record) = read_json_opt(&dir.join(format!("{idx:09}.json"))).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn last_record_index(&self) -> Result<u64, OcrError> {
        Ok(record_indices(&self.dataset_dir())
            .await?
            .into_iter()
            .max()
            .unwrap_or(0))
    }
}

/// Numeric stems of `*.json` files in `dir`; empty if `dir` does not exist.
async fn record_indices(dir: &Path) -> Result<Vec<u64>, OcrError> {
    let read_err = |source| OcrError::StorageReadFailed {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_err(e)),
    };

    let mut indices = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(idx) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u64>().ok())
        {
            indices.push(idx);
        }
    }
    Ok(indices)
}

async fn read_json_opt<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, OcrError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(OcrError::StorageReadFailed {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| OcrError::Internal(format!("{} is corrupt: {e}", path.display())))
}

/// Atomic write: serialise, write to temp, then rename.
async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), OcrError> {
    let write_err = |source| OcrError::StorageWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| OcrError::Internal(format!("Failed to serialise {}: {e}", path.display())))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_input_reads_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let input = tokio_test::block_on(storage.read_input()).unwrap();
        assert_eq!(input, Value::Null);
    }

    #[tokio::test]
    async fn input_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage
            .write_input(&json!({ "invoiceId": "INV1" }))
            .await
            .unwrap();
        assert_eq!(
            storage.read_input().await.unwrap(),
            json!({ "invoiceId": "INV1" })
        );
    }

    #[tokio::test]
    async fn corrupt_input_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let path = storage.input_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{ nope").unwrap();
        assert!(storage.read_input().await.unwrap_err().is_input_error());
    }

    #[tokio::test]
    async fn records_append_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        for id in ["A", "B", "C"] {
            let record = OutputRecord {
                attachment_id: id.into(),
                ..Default::default()
            };
            storage.push_record(&record).await.unwrap();
        }
        let ids: Vec<String> = storage
            .records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.attachment_id)
            .collect();
        assert_eq!(ids, ["A", "B", "C"]);
        assert!(dir
            .path()
            .join("datasets/default/000000003.json")
            .exists());
    }

    #[tokio::test]
    async fn status_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        assert!(storage.status().await.unwrap().is_none());

        let mut status = StatusSummary {
            ok: false,
            ..Default::default()
        };
        storage.set_status(&status).await.unwrap();
        status.ok = true;
        storage.set_status(&status).await.unwrap();

        assert!(storage.status().await.unwrap().unwrap().ok);
        assert!(!storage.status_path().with_extension("json.tmp").exists());
    }
}
