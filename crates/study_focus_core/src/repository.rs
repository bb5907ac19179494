//! crates/study_focus_core/src/repository.rs
//!
//! Whole-collection repositories over the document store, and the user
//! repository built on them.
//!
//! Every write reads the full collection, changes one record and writes the
//! full collection back. Two writers interleaving between the read and the
//! write lose one of the updates; nothing here detects that.
//!
//! Entries that cannot be read as records are skipped by `load` but kept
//! verbatim by the user repository's writes.

use crate::domain::{SessionPointer, UserRecord};
use crate::ports::{PortError, PortResult};
use crate::store::{keys, DocumentStore};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use tracing::{debug, info, warn};

//=========================================================================================
// Generic collection repository
//=========================================================================================

/// A collection persisted as a single document.
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// The readable part of the collection; missing or malformed documents
    /// read as empty.
    async fn load(&self) -> PortResult<Vec<T>>;

    /// Replaces the full collection.
    async fn save_all(&self, items: &[T]) -> PortResult<()>;
}

/// A `Repository` storing a JSON array under one key.
pub struct JsonCollection<T> {
    store: DocumentStore,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCollection<T> {
    pub fn new(store: DocumentStore, key: &'static str) -> Self {
        Self {
            store,
            key,
            _marker: PhantomData,
        }
    }

    /// The stored array as untyped entries.
    pub async fn load_raw(&self) -> PortResult<Vec<Value>> {
        Ok(self
            .store
            .read::<Vec<Value>>(self.key)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_raw(&self, entries: &[Value]) -> PortResult<()> {
        self.store.write(self.key, entries).await
    }
}

impl<T> Clone for JsonCollection<T> {
    fn clone(&self) -> Self {
        Self::new(self.store.clone(), self.key)
    }
}

#[async_trait]
impl<T> Repository<T> for JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn load(&self) -> PortResult<Vec<T>> {
        let entries = self.load_raw().await?;
        Ok(entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value::<T>(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(key = self.key, index, error = %e, "skipping unreadable entry");
                    None
                }
            })
            .collect())
    }

    async fn save_all(&self, items: &[T]) -> PortResult<()> {
        self.store.write(self.key, items).await
    }
}

//=========================================================================================
// User repository
//=========================================================================================

/// Why `create` refused a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    DuplicateId,
    DuplicateEmail,
}

/// Owns the user collection and the session pointer.
#[derive(Clone)]
pub struct UserRepository {
    store: DocumentStore,
    users: JsonCollection<UserRecord>,
}

/// Whether `entry[name]` reads as `expected`, the way `UserRecord` reads it.
fn field_is(entry: &Value, name: &str, expected: &str) -> bool {
    match entry.get(name) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        _ => false,
    }
}

fn to_entry(record: &UserRecord) -> PortResult<Value> {
    serde_json::to_value(record).map_err(|e| PortError::Unexpected(e.to_string()))
}

impl UserRepository {
    pub fn new(store: DocumentStore) -> Self {
        let users = JsonCollection::new(store.clone(), keys::USERS);
        Self { store, users }
    }

    /// The underlying collection, for callers that need raw load/save_all.
    pub fn collection(&self) -> &JsonCollection<UserRecord> {
        &self.users
    }

    /// Every readable user, with load-time defaults applied.
    pub async fn find_all(&self) -> PortResult<Vec<UserRecord>> {
        let mut users = self.users.load().await?;
        users.iter_mut().for_each(UserRecord::normalize);
        debug!(count = users.len(), "loaded users");
        Ok(users)
    }

    pub async fn find_by_id(&self, id: &str) -> PortResult<Option<UserRecord>> {
        Ok(self.find_all().await?.into_iter().find(|u| u.id == id))
    }

    pub async fn find_by_email(&self, email: &str) -> PortResult<Option<UserRecord>> {
        Ok(self.find_all().await?.into_iter().find(|u| u.email == email))
    }

    /// Replaces the stored record with the same id.
    ///
    /// Never inserts: an unknown id is a silent no-op and yields `false`.
    /// Every other entry is written back untouched.
    pub async fn save(&self, record: &UserRecord) -> PortResult<bool> {
        let mut entries = self.users.load_raw().await?;
        let Some(slot) = entries.iter_mut().find(|e| field_is(e, "id", &record.id)) else {
            warn!(user_id = %record.id, "save skipped: no such user");
            return Ok(false);
        };
        *slot = to_entry(record)?;
        self.users.save_raw(&entries).await?;
        debug!(user_id = %record.id, "user saved");
        Ok(true)
    }

    /// Appends a new record when both its id and email are unused, counting
    /// entries that could not be read as records.
    pub async fn create(&self, record: UserRecord) -> PortResult<CreateOutcome> {
        let mut entries = self.users.load_raw().await?;
        if entries.iter().any(|e| field_is(e, "id", &record.id)) {
            return Ok(CreateOutcome::DuplicateId);
        }
        if entries.iter().any(|e| field_is(e, "email", &record.email)) {
            return Ok(CreateOutcome::DuplicateEmail);
        }
        info!(user_id = %record.id, "creating user");
        entries.push(to_entry(&record)?);
        self.users.save_raw(&entries).await?;
        Ok(CreateOutcome::Created)
    }

    //-------------------------------------------------------------------------------------
    // Session pointer
    //-------------------------------------------------------------------------------------

    pub async fn session_pointer(&self) -> PortResult<Option<SessionPointer>> {
        self.store.read(keys::CURRENT_USER).await
    }

    pub async fn set_session_pointer(&self, pointer: &SessionPointer) -> PortResult<()> {
        info!(user_id = %pointer.id, "session pointer set");
        self.store.write(keys::CURRENT_USER, pointer).await
    }

    pub async fn clear_session_pointer(&self) -> PortResult<()> {
        info!("session pointer cleared");
        self.store.remove(keys::CURRENT_USER).await
    }

    /// Resolves the session pointer to a full record.
    ///
    /// `None` when nobody is signed in or the pointer names a missing user.
    pub async fn current_user(&self) -> PortResult<Option<UserRecord>> {
        let Some(pointer) = self.session_pointer().await? else {
            return Ok(None);
        };
        let user = self.find_by_id(&pointer.id).await?;
        if user.is_none() {
            warn!(user_id = %pointer.id, "session pointer names an unknown user");
        }
        Ok(user)
    }
}
