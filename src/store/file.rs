//! File-backed store — one file per key inside a directory.
//!
//! Keys are escaped into file names: every byte outside `[A-Za-z0-9_-]`
//! is written as `%XX`, so `listing-assist:draft:rfp` is stored as
//! `listing-assist%3Adraft%3Arfp.json`. Distinct keys never share a file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::StorageError;
use crate::store::traits::KeyValueStore;

pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_path`. The directory is created on
    /// first write.
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File that holds `key`.
    pub fn resolve_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", escape_key(key)))
    }
}

fn escape_key(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            name.push(char::from(byte));
        } else {
            name.push_str(&format!("%{byte:02X}"));
        }
    }
    name
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.resolve_path(key);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path).await?;
        let path = self.resolve_path(key);
        // readers only ever see a complete file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .await
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        debug!(path = %path.display(), "Wrote store entry");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        match fs::remove_file(self.resolve_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn crud_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("drafts"));

        assert!(store.get("a:b").await.unwrap().is_none());
        store.set("a:b", r#"{"x":1}"#).await.unwrap();
        assert_eq!(store.get("a:b").await.unwrap().as_deref(), Some(r#"{"x":1}"#));
        assert!(store.resolve_path("a:b").ends_with("a%3Ab.json"));

        assert!(store.remove("a:b").await.unwrap());
        assert!(!store.remove("a:b").await.unwrap());
        assert!(store.get("a:b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn punctuation_keys_stay_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());

        store.set("a:b", "colon").await.unwrap();
        store.set("a_b", "underscore").await.unwrap();
        store.set("a.b", "dot").await.unwrap();
        store.set("a%3Ab", "literal").await.unwrap();

        assert_eq!(store.get("a:b").await.unwrap().as_deref(), Some("colon"));
        assert_eq!(store.get("a_b").await.unwrap().as_deref(), Some("underscore"));
        assert_eq!(store.get("a.b").await.unwrap().as_deref(), Some("dot"));
        assert_eq!(store.get("a%3Ab").await.unwrap().as_deref(), Some("literal"));
    }

    #[tokio::test]
    async fn key_cannot_escape_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        let path = store.resolve_path("../../etc/passwd");
        assert_eq!(path.parent().unwrap(), dir.path());
    }
}
