//! Shared Engine
//!
//! Thread-safe handle around an [`Engine`].
//!
//! ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
//!
//! - **Reads** (get/contains_key/stats/snapshot): shared read lock, many
//!   readers at once; values are cloned out so no reference outlives the lock
//! - **Writes** (put/delete/flush/compact): exclusive write lock
//!   - A flush or compaction holds the lock until the chain is fully
//!     replaced, so readers never observe a partially-swapped chain
//!   - Flush and compaction are mutually exclusive
//!
//! Cloning the handle shares the same engine.

use std::borrow::Borrow;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::command::Command;
use crate::compaction::CompactionStats;
use crate::config::Config;
use crate::engine::{Engine, EngineStats};
use crate::error::Result;

/// Cloneable, thread-safe engine handle
#[derive(Debug)]
pub struct SharedEngine<K, V> {
    inner: Arc<RwLock<Engine<K, V>>>,
}

impl<K, V> Clone for SharedEngine<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> SharedEngine<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    /// Create a shared handle around a new engine
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self::from_engine(Engine::new(config)?))
    }

    pub fn from_engine(engine: Engine<K, V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Get a cloned value by key (read lock)
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.read().get(key).cloned()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.read().contains_key(key)
    }

    /// Put a key-value pair (write lock)
    pub fn put(&self, key: K, value: V) -> Result<()> {
        self.inner.write().put(key, value)
    }

    /// Delete a key (write lock)
    pub fn delete(&self, key: K) -> Result<()> {
        self.inner.write().delete(key)
    }

    /// Flush the memtable (write lock)
    pub fn flush(&self) -> Result<()> {
        self.inner.write().flush()
    }

    /// Compact the chain (write lock)
    pub fn compact(&self) -> Result<CompactionStats> {
        self.inner.write().compact()
    }

    /// Execute a command (write lock, since most commands mutate)
    pub fn execute(&self, command: Command<K, V>) -> Result<Option<V>> {
        self.inner.write().execute(command)
    }

    pub fn stats(&self) -> EngineStats {
        self.inner.read().stats()
    }

    /// Run a closure against the engine under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&Engine<K, V>) -> R) -> R {
        let engine = self.inner.read();
        f(&*engine)
    }

    /// Take the engine back if this is the last handle
    pub fn try_into_inner(self) -> std::result::Result<Engine<K, V>, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<K, V> SharedEngine<K, V>
where
    K: Ord + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Encode the visible state (read lock)
    pub fn snapshot(&self) -> Result<Bytes> {
        self.inner.read().snapshot()
    }
}
