//! services/app/src/state.rs
//!
//! The shared application state, created once at startup.

use crate::adapters::{FileStore, SystemClock};
use crate::config::Config;
use crate::error::AppError;
use std::sync::Arc;
use study_focus_core::{Clock, DocumentStore, KeyValueStore, Session};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the file store under `config.data_dir` and the system clock.
    pub async fn from_config(config: Arc<Config>) -> Result<Self, AppError> {
        let store = FileStore::open(&config.data_dir).await?;
        Ok(Self {
            store: Arc::new(store),
            clock: Arc::new(SystemClock),
            config,
        })
    }

    /// A `Session` context over this state's store, clock and calendar.
    pub fn session(&self) -> Session {
        Session::new(
            DocumentStore::new(self.store.clone()),
            self.clock.clone(),
            self.config.calendar(),
        )
    }
}
