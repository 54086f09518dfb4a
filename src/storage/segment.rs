//! Segment implementation
//!
//! Immutable sorted snapshot of entries, produced by flush or compaction.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::slice;

use crate::error::{LsmError, Result};
use crate::memtable::Entry;

/// An immutable, sorted, read-only run of entries ("SSTable")
///
/// Keys are unique and strictly ascending. A segment is never mutated
/// after construction; the chain only ever replaces segments wholesale.
#[derive(Debug, Clone)]
pub struct Segment<K, V> {
    /// Sequence number assigned by the chain (flush / compaction order)
    id: u64,
    /// Entries in ascending key order
    entries: Vec<(K, Entry<V>)>,
    /// Number of tombstones among `entries`
    tombstones: usize,
}

impl<K: Ord, V> Segment<K, V> {
    /// Build a segment from caller-supplied entries
    ///
    /// Fails with `InvalidSegment` unless keys are strictly ascending.
    pub fn new(id: u64, entries: Vec<(K, Entry<V>)>) -> Result<Self> {
        if let Some(pos) = first_unordered(&entries) {
            return Err(LsmError::InvalidSegment(format!(
                "keys not strictly ascending at position {}",
                pos
            )));
        }
        Ok(Self::from_sorted(id, entries))
    }

    /// Build a segment from entries already known to be sorted and unique
    /// (memtable drains and compaction output).
    pub(crate) fn from_sorted(id: u64, entries: Vec<(K, Entry<V>)>) -> Self {
        debug_assert!(first_unordered(&entries).is_none());

        let tombstones = entries.iter().filter(|(_, e)| e.is_tombstone()).count();
        Self {
            id,
            entries,
            tombstones,
        }
    }

    /// Binary-search the entry for a key
    ///
    /// Returns the stored entry (live or tombstone), or `None` if this
    /// segment holds nothing for the key.
    pub fn get<Q>(&self, key: &Q) -> Option<&Entry<V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries
            .binary_search_by(|(k, _)| k.borrow().cmp(key))
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    /// Quick check if a key might be in this segment (range check)
    /// Returns false only if the key is definitely outside [min_key, max_key]
    pub fn might_contain<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match (self.min_key(), self.max_key()) {
            (Some(min), Some(max)) => key >= min.borrow() && key <= max.borrow(),
            _ => false, // Empty segment
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of entries (tombstones included)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tombstone_count(&self) -> usize {
        self.tombstones
    }

    /// Smallest key in this segment
    pub fn min_key(&self) -> Option<&K> {
        self.entries.first().map(|(k, _)| k)
    }

    /// Largest key in this segment
    pub fn max_key(&self) -> Option<&K> {
        self.entries.last().map(|(k, _)| k)
    }

    /// Entries in ascending key order
    pub fn entries(&self) -> &[(K, Entry<V>)] {
        &self.entries
    }

    pub fn iter(&self) -> slice::Iter<'_, (K, Entry<V>)> {
        self.entries.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a Segment<K, V> {
    type Item = &'a (K, Entry<V>);
    type IntoIter = slice::Iter<'a, (K, Entry<V>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Index of the first entry whose key is not greater than its predecessor
fn first_unordered<K: Ord, V>(entries: &[(K, Entry<V>)]) -> Option<usize> {
    entries
        .windows(2)
        .position(|pair| pair[0].0.cmp(&pair[1].0) != Ordering::Less)
        .map(|pos| pos + 1)
}
