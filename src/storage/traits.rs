//! Object store trait definitions

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0:?}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Key of the raw video snapshot for a run.
pub fn raw_key(tracking_id: &str) -> String {
    format!("{tracking_id}.json")
}

/// Key of the finalized analysis for a run.
pub fn analyzed_key(tracking_id: &str) -> String {
    format!("{tracking_id}_analyzed.json")
}

/// Keys are flat object names; no path separators or parent references.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// A flat bucket of named byte blobs.
///
/// Implementations must be safe to share across tasks.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` under `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> StorageResult<()>;

    /// Read the object under `key`. Missing objects are `StorageError::NotFound`.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Human-readable location of `key`, for log lines.
    fn location(&self, key: &str) -> String;
}

/// Serialize `value` as JSON and store it.
pub async fn put_json<T: Serialize + Sync>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let bytes = serde_json::to_vec(value)?;
    store.put(key, bytes).await
}

/// Load and decode a JSON object.
pub async fn get_json<T: DeserializeOwned>(store: &dyn ObjectStore, key: &str) -> StorageResult<T> {
    let bytes = store.get(key).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
