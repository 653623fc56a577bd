//! # Aggregate State Stores
//!
//! A store holds exactly one [`AggregateState`] and applies updates
//! atomically: `try_update` reads, validates and writes under one lock, so
//! there is no window between the precondition check and the write.
//!
//! - [`InMemoryAggregateStore`]: `parking_lot::Mutex` around the state.
//! - [`FileAggregateStore`]: JSON file replaced by write-then-rename, so
//!   readers never observe a partial write. The lock is per process; run
//!   one writer process per state file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::aggregate::AggregateState;
use crate::error::StateError;

/// Durable home of the aggregate state.
pub trait AggregateStore: Send + Sync {
    /// Read the current state.
    fn load(&self) -> Result<AggregateState, StateError>;

    /// Atomically replace the state with `f(current)`.
    ///
    /// If `f` returns an error, nothing is written and the error is passed
    /// through. Returns the new state on success.
    fn try_update<F>(&self, f: F) -> Result<AggregateState, StateError>
    where
        F: FnOnce(&AggregateState) -> Result<AggregateState, StateError>;
}

impl<T: AggregateStore> AggregateStore for std::sync::Arc<T> {
    fn load(&self) -> Result<AggregateState, StateError> {
        (**self).load()
    }

    fn try_update<F>(&self, f: F) -> Result<AggregateState, StateError>
    where
        F: FnOnce(&AggregateState) -> Result<AggregateState, StateError>,
    {
        (**self).try_update(f)
    }
}

// ─── In-memory ──────────────────────────────────────────────────────

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryAggregateStore {
    state: Mutex<AggregateState>,
}

impl InMemoryAggregateStore {
    /// A store initialized to `(false, 0, 0, 0)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store initialized to `state`.
    pub fn with_state(state: AggregateState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl AggregateStore for InMemoryAggregateStore {
    fn load(&self) -> Result<AggregateState, StateError> {
        Ok(*self.state.lock())
    }

    fn try_update<F>(&self, f: F) -> Result<AggregateState, StateError>
    where
        F: FnOnce(&AggregateState) -> Result<AggregateState, StateError>,
    {
        let mut guard = self.state.lock();
        let next = f(&guard)?;
        *guard = next;
        Ok(next)
    }
}

// ─── File-backed ────────────────────────────────────────────────────

/// JSON file store.
#[derive(Debug)]
pub struct FileAggregateStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileAggregateStore {
    /// Open the store at `path`, creating it zeroed if absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let store = Self {
            path,
            lock: Mutex::new(()),
        };
        if !store.path.exists() {
            store.write(&AggregateState::INITIAL)?;
            tracing::info!(path = %store.path.display(), "initialized aggregate state");
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<AggregateState, StateError> {
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write(&self, state: &AggregateState) -> Result<(), StateError> {
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&serde_json::to_vec_pretty(state)?)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path).map_err(|e| {
            StateError::Storage(format!(
                "failed to replace {}: {e}",
                self.path.display()
            ))
        })
    }
}

impl AggregateStore for FileAggregateStore {
    fn load(&self) -> Result<AggregateState, StateError> {
        let _guard = self.lock.lock();
        self.read()
    }

    fn try_update<F>(&self, f: F) -> Result<AggregateState, StateError>
    where
        F: FnOnce(&AggregateState) -> Result<AggregateState, StateError>,
    {
        let _guard = self.lock.lock();
        let current = self.read()?;
        let next = f(&current)?;
        self.write(&next)?;
        Ok(next)
    }
}
