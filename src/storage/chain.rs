//! Segment Chain
//!
//! Owns every segment and orders them by recency.
//!
//! ## Responsibilities
//! - Search segments newest → oldest for reads
//! - Accept new segments from MemTable flushes at the head
//! - Swap the whole chain for a compaction result
//! - Hand out segment IDs

use std::borrow::Borrow;
use std::collections::{vec_deque, VecDeque};

use crate::memtable::Entry;

use super::Segment;

/// Ordered collection of segments, newest first
///
/// For any key, the segment nearest the head holds its most recent
/// flushed version; older entries for the same key are obsolete.
#[derive(Debug, Clone)]
pub struct SegmentChain<K, V> {
    /// Segments ordered newest → oldest
    segments: VecDeque<Segment<K, V>>,

    /// Next ID for creating new segments
    next_segment_id: u64,
}

impl<K: Ord, V> SegmentChain<K, V> {
    /// Create an empty chain; the first segment gets ID 1
    pub fn new() -> Self {
        Self {
            segments: VecDeque::new(),
            next_segment_id: 1,
        }
    }

    /// Reserve the ID for the next segment built by the caller
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_segment_id;
        self.next_segment_id += 1;
        id
    }

    /// Get the entry for a key (searches all segments newest → oldest)
    ///
    /// Returns the entry from the first segment that holds the key, live
    /// or tombstone. Older segments are never consulted once a match is
    /// found.
    pub fn get<Q>(&self, key: &Q) -> Option<&Entry<V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.segments
            .iter()
            .filter(|segment| segment.might_contain(key))
            .find_map(|segment| segment.get(key))
    }

    /// Install a segment as the newest in the chain
    pub fn push_newest(&mut self, segment: Segment<K, V>) {
        self.segments.push_front(segment);
    }

    /// Replace the whole chain with at most one segment
    ///
    /// Returns the retired segments so the caller decides when they drop.
    pub fn replace(&mut self, merged: Option<Segment<K, V>>) -> VecDeque<Segment<K, V>> {
        let replacement: VecDeque<_> = merged.into_iter().collect();
        std::mem::replace(&mut self.segments, replacement)
    }

    /// Get the number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total entries across all segments (tombstones and obsolete versions included)
    pub fn total_entries(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    /// Total tombstones across all segments
    pub fn total_tombstones(&self) -> usize {
        self.segments.iter().map(Segment::tombstone_count).sum()
    }

    /// The newest segment, if any
    pub fn newest(&self) -> Option<&Segment<K, V>> {
        self.segments.front()
    }

    /// Iterate segments newest → oldest
    pub fn iter(&self) -> vec_deque::Iter<'_, Segment<K, V>> {
        self.segments.iter()
    }

    /// Get the next segment ID (for testing/debugging)
    pub fn next_segment_id(&self) -> u64 {
        self.next_segment_id
    }
}

impl<K: Ord, V> Default for SegmentChain<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
