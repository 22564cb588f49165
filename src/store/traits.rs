//! `KeyValueStore` trait — the storage collaborator behind autosave.

use async_trait::async_trait;

use crate::error::StorageError;

/// String key-value storage.
///
/// Anything that can hold a string under a string key can back autosave:
/// an in-memory map, a directory of files, a local database.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Returns whether something was removed.
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;
}
