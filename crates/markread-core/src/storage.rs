use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StorageError;
use crate::keys;

/// A batch of key/value pairs as read from or written to storage.
pub type StorageMap = BTreeMap<String, Value>;

/// Flat asynchronous key/value store provided by the host.
///
/// Individual calls are serialized by the backend; there are no transactions
/// spanning multiple calls.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fetch the given keys. Absent keys are omitted from the result.
    async fn get(&self, keys: &[String]) -> Result<StorageMap, StorageError>;

    /// Fetch every stored pair.
    async fn get_all(&self) -> Result<StorageMap, StorageError>;

    /// Insert or overwrite every pair in `items`.
    async fn set(&self, items: StorageMap) -> Result<(), StorageError>;

    /// Delete `keys`. Missing keys are not an error.
    async fn remove(&self, keys: &[String]) -> Result<(), StorageError>;

    /// Delete everything, settings included.
    async fn clear(&self) -> Result<(), StorageError>;

    /// Approximate bytes used by `keys`, or by the whole store when `None`.
    async fn bytes_in_use(&self, keys: Option<&[String]>) -> Result<u64, StorageError>;
}

/// Bytes charged for one stored pair: key plus serialized value, UTF-8.
pub fn entry_size(key: &str, value: &Value) -> u64 {
    (key.len() + value.to_string().len()) as u64
}

/// Number of keys that classify as link records.
pub fn count_link_keys<'a>(keys_iter: impl IntoIterator<Item = &'a String>) -> usize {
    keys_iter
        .into_iter()
        .filter(|k| keys::is_link_key(k))
        .count()
}
