//! crates/study_focus_core/src/store.rs
//!
//! Typed JSON documents on top of the raw `KeyValueStore` port, plus an
//! in-process store implementation.

use crate::ports::{KeyValueStore, PortError, PortResult};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Well-known document keys.
pub mod keys {
    /// The full collection of user records.
    pub const USERS: &str = "users";
    /// The session pointer of the signed-in user.
    pub const CURRENT_USER: &str = "currentUser";
    /// Legacy top-level task list, not scoped to a user.
    pub const TASKS: &str = "tasks";
    /// Legacy top-level study session list, not scoped to a user.
    pub const STUDY_SESSIONS: &str = "studySessions";
}

//=========================================================================================
// DocumentStore
//=========================================================================================

/// Reads and writes whole JSON documents under named keys.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<dyn KeyValueStore>,
}

impl DocumentStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    /// Loads and deserializes the document under `key`.
    ///
    /// A missing key and a document that fails to parse both come back as
    /// `Ok(None)`; only store failures are errors.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> PortResult<Option<T>> {
        let Some(raw) = self.inner.get(key).await? else {
            debug!(key, "document absent");
            return Ok(None);
        };
        match serde_json::from_str::<T>(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "malformed document, treating as absent");
                Ok(None)
            }
        }
    }

    /// Serializes `value` and replaces the document under `key`.
    pub async fn write<T>(&self, key: &str, value: &T) -> PortResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let raw = serde_json::to_string(value).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.inner.set(key, raw).await
    }

    pub async fn remove(&self, key: &str) -> PortResult<()> {
        self.inner.remove(key).await
    }
}

//=========================================================================================
// InMemoryStore
//=========================================================================================

/// A `KeyValueStore` that lives in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds the given raw documents.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> PortError {
    PortError::Unexpected(format!("in-memory store lock poisoned: {e}"))
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> PortResult<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }
}
