use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use coder_logging::{coder_debug, coder_error, coder_warn};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::effect::effects_for;
use crate::{AppState, Effect, Store, Subscription};

/// State slices mirrored to durable storage, one entry each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Jobs,
    ResultsData,
    SelectedJobId,
    SelectedResult,
    HideCoded,
    SessionId,
}

impl StorageKey {
    pub const ALL: [StorageKey; 6] = [
        StorageKey::Jobs,
        StorageKey::ResultsData,
        StorageKey::SelectedJobId,
        StorageKey::SelectedResult,
        StorageKey::HideCoded,
        StorageKey::SessionId,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::Jobs => "jobs",
            StorageKey::ResultsData => "resultsData",
            StorageKey::SelectedJobId => "selectedJobId",
            StorageKey::SelectedResult => "selectedResult",
            StorageKey::HideCoded => "hideCoded",
            StorageKey::SessionId => "sessionID",
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode slice: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// String-valued durable key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// In-process storage, used by tests and as a fallback when no directory is configured.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries().clear();
        Ok(())
    }
}

/// Serialises one slice of `state` into storage.
pub fn write_slice(
    storage: &dyn KeyValueStore,
    state: &AppState,
    key: StorageKey,
) -> Result<(), StorageError> {
    let encoded = match key {
        StorageKey::Jobs => serde_json::to_string(&state.jobs)?,
        StorageKey::ResultsData => serde_json::to_string(&state.results_data)?,
        StorageKey::SelectedJobId => serde_json::to_string(&state.selected_job_id)?,
        StorageKey::SelectedResult => serde_json::to_string(&state.selected_result)?,
        StorageKey::HideCoded => serde_json::to_string(&state.hide_coded)?,
        StorageKey::SessionId => serde_json::to_string(&state.session_id)?,
    };
    storage.set(key.as_str(), &encoded)
}

/// Rebuilds state from storage. Each slice that is missing, unreadable or
/// malformed falls back to its default independently.
pub fn restore_state(storage: &dyn KeyValueStore) -> AppState {
    AppState {
        jobs: read_slice(storage, StorageKey::Jobs),
        results_data: read_slice(storage, StorageKey::ResultsData),
        selected_job_id: read_slice(storage, StorageKey::SelectedJobId),
        selected_result: read_slice(storage, StorageKey::SelectedResult),
        hide_coded: read_slice(storage, StorageKey::HideCoded),
        session_id: read_slice(storage, StorageKey::SessionId),
        load_epoch: 0,
    }
}

fn read_slice<T: DeserializeOwned + Default>(storage: &dyn KeyValueStore, key: StorageKey) -> T {
    let raw = match storage.get(key.as_str()) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(err) => {
            coder_warn!("Failed to read {} from storage: {}", key.as_str(), err);
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            coder_warn!("Discarding unparsable {} from storage: {}", key.as_str(), err);
            T::default()
        }
    }
}

/// Registers the durable-write subscriber on `store`.
pub fn attach_persistence(store: &mut Store, storage: Arc<dyn KeyValueStore>) -> Subscription {
    store.subscribe_all(move |state, action| {
        for effect in effects_for(action, state) {
            match effect {
                Effect::Persist(key) => {
                    if let Err(err) = write_slice(storage.as_ref(), state, key) {
                        coder_error!("Failed to persist {}: {}", key.as_str(), err);
                    }
                }
                Effect::ClearStorage => {
                    if let Err(err) = storage.clear() {
                        coder_error!("Failed to clear storage: {}", err);
                    }
                }
                Effect::Remote(_) => {}
            }
        }
        coder_debug!("Persisted slices after {:?}", action.kind());
    })
}
