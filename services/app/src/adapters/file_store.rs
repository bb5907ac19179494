//! services/app/src/adapters/file_store.rs
//!
//! A `KeyValueStore` keeping each key in its own JSON file under a data
//! directory. Writes go to a temporary file first and are renamed into place,
//! so a crash mid-write leaves the previous document intact.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use study_focus_core::{KeyValueStore, PortError, PortResult};
use tokio::fs;
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens the store, creating `root` if needed.
    pub async fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "file store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PortResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

/// Keys become file names, so only `[A-Za-z0-9_-]` is allowed.
fn validate_key(key: &str) -> PortResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(PortError::Unexpected(format!("invalid storage key: {key:?}")))
    }
}

fn io_error(op: &str, path: &Path, e: std::io::Error) -> PortError {
    error!(path = %path.display(), "failed to {op}: {e}");
    PortError::Unexpected(format!("failed to {op} {}: {e}", path.display()))
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read", &path, e)),
        }
    }

    async fn set(&self, key: &str, value: String) -> PortResult<()> {
        let path = self.path_for(key)?;
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, value)
            .await
            .map_err(|e| io_error("write", &temp_path, e))?;
        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| io_error("replace", &path, e))?;
        debug!(key, "document written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn documents_persist_across_instances() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.set("users", "[]".to_string()).await.unwrap();

        let reopened = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.get("users").await.unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("users.json").exists());
        assert!(!dir.path().join("users.json.tmp").exists());
    }

    #[tokio::test]
    async fn missing_keys_read_as_absent_and_remove_quietly() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("nested")).await.unwrap();
        assert!(store.get("currentUser").await.unwrap().is_none());
        store.remove("currentUser").await.unwrap();

        store.set("currentUser", "{}".to_string()).await.unwrap();
        store.remove("currentUser").await.unwrap();
        assert!(store.get("currentUser").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn keys_cannot_escape_the_data_directory() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        for key in ["../users", "a/b", "", "users.json"] {
            assert!(store.set(key, "x".to_string()).await.is_err(), "{key}");
        }
    }
}
