//! Key-value blob storage
//!
//! The mock backend: each collection persists as one JSON array blob
//! under a dedicated key. Backends move raw strings only; collection
//! encoding and the malformed-blob recovery live in the helpers here.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::AppError;

/// Raw blob backend
///
/// Implementations are shared across all entity stores; each store
/// addresses its collection by key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the blob stored under `key`, if any.
    async fn read(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Write `value` under `key`, replacing any previous blob.
    async fn write(&self, key: &str, value: &str) -> Result<(), AppError>;
}

/// File-backed blob store
///
/// One `<key>.json` file per key under the data directory.
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Open the store, creating the data directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            AppError::Storage(format!(
                "failed to create data dir {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!("read of {key} failed: {e}"))),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        tokio::fs::write(self.path_for(key), value)
            .await
            .map_err(|e| AppError::Storage(format!("write of {key} failed: {e}")))
    }
}

/// In-memory blob store
///
/// Backs tests and ephemeral runs; contents die with the process.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        let blobs = self
            .blobs
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(blobs.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut blobs = self
            .blobs
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Decode a collection blob.
///
/// An absent key is an empty collection. A blob that fails to parse is
/// recovered as empty rather than treated as fatal; the app stays
/// usable at the cost of the damaged records.
pub async fn load_collection<T: DeserializeOwned>(
    backend: &dyn BlobStore,
    key: &str,
) -> Result<Vec<T>, AppError> {
    let Some(raw) = backend.read(key).await? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str(&raw) {
        Ok(records) => Ok(records),
        Err(error) => {
            crate::metrics::ERRORS_TOTAL
                .with_label_values(&["malformed_storage", key])
                .inc();
            tracing::warn!(key, %error, "stored collection is malformed; treating as empty");
            Ok(Vec::new())
        }
    }
}

/// Encode and persist a full collection under `key`.
pub async fn save_collection<T: Serialize>(
    backend: &dyn BlobStore,
    key: &str,
    records: &[T],
) -> Result<(), AppError> {
    let raw = serde_json::to_string(records)?;
    backend.write(key, &raw).await
}
