//! MemTable implementation
//!
//! BTreeMap-based sorted write buffer.

use std::borrow::Borrow;
use std::collections::btree_map::{self, BTreeMap};

use crate::error::Result;
use super::Entry;

/// In-memory table for recent writes
///
/// Keys are unique and ascending at every observation point. A later write
/// for a key replaces the earlier one in place.
#[derive(Debug, Clone)]
pub struct MemTable<K, V> {
    /// Sorted buffer: key → newest entry
    data: BTreeMap<K, Entry<V>>,

    /// Number of tombstones currently buffered
    tombstones: usize,
}

impl<K: Ord, V> MemTable<K, V> {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            tombstones: 0,
        }
    }

    /// Get the entry for a key
    ///
    /// Returns:
    /// - `Some(Entry::Value(_))`: live value buffered
    /// - `Some(Entry::Tombstone)`: key deleted in this buffer
    /// - `None`: key not buffered at all
    pub fn get<Q>(&self, key: &Q) -> Option<&Entry<V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.data.get(key)
    }

    /// Put a key-value pair, replacing any earlier entry for the key
    ///
    /// Returns the new distinct key count
    pub fn put(&mut self, key: K, value: V) -> usize {
        self.insert(key, Entry::Value(value))
    }

    /// Delete a key (inserts a tombstone)
    ///
    /// Returns the new distinct key count
    pub fn delete(&mut self, key: K) -> usize {
        self.insert(key, Entry::Tombstone)
    }

    fn insert(&mut self, key: K, entry: Entry<V>) -> usize {
        if entry.is_tombstone() {
            self.tombstones += 1;
        }
        if let Some(old) = self.data.insert(key, entry) {
            if old.is_tombstone() {
                self.tombstones -= 1;
            }
        }
        self.data.len()
    }

    /// Number of distinct keys buffered (tombstones included)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Number of buffered tombstones
    pub fn tombstone_count(&self) -> usize {
        self.tombstones
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all entries in ascending key order
    pub fn iter(&self) -> btree_map::Iter<'_, K, Entry<V>> {
        self.data.iter()
    }

    /// Take the full sorted content, leaving the MemTable empty
    ///
    /// The output buffer is reserved up front; on allocation failure the
    /// MemTable keeps its content.
    pub fn drain(&mut self) -> Result<Vec<(K, Entry<V>)>> {
        let mut entries = Vec::new();
        entries.try_reserve_exact(self.data.len())?;

        entries.extend(std::mem::take(&mut self.data));
        self.tombstones = 0;

        Ok(entries)
    }

    /// Clear all entries (after a compaction absorbed them)
    pub fn clear(&mut self) {
        self.data.clear();
        self.tombstones = 0;
    }
}

impl<K: Ord, V> Default for MemTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, V> IntoIterator for &'a MemTable<K, V> {
    type Item = (&'a K, &'a Entry<V>);
    type IntoIter = btree_map::Iter<'a, K, Entry<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
