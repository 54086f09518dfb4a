//! Engine Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Route writes into the MemTable
//! - Trigger flushes when the MemTable reaches its key threshold
//! - Resolve reads across MemTable and segments by recency
//! - Run compaction on demand or by policy

use std::borrow::Borrow;
use std::fmt;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::command::Command;
use crate::compaction::{self, CompactionStats};
use crate::config::{CompactionScope, CompactionTrigger, Config};
use crate::error::Result;
use crate::memtable::{Entry, MemTable};
use crate::storage::{Segment, SegmentChain};

/// Source iterator handed to the compactor
type Source<'a, K, V> = Box<dyn Iterator<Item = (&'a K, &'a Entry<V>)> + 'a>;

/// The main storage engine
///
/// ## Ownership Model
///
/// The engine exclusively owns one MemTable and one segment chain.
/// - **Writes** (put/delete/flush/compact) take `&mut self` and run to
///   completion on the calling thread
/// - **Reads** (get) take `&self`
/// - Flush moves the MemTable content into a new segment; compaction
///   swaps the whole chain for the merged result
///
/// For shared access across threads, wrap it in [`SharedEngine`].
///
/// [`SharedEngine`]: crate::shared::SharedEngine
#[derive(Debug, Clone)]
pub struct Engine<K, V> {
    /// Engine configuration
    config: Config,

    /// In-memory table for recent writes
    memtable: MemTable<K, V>,

    /// Immutable segments, newest first
    chain: SegmentChain<K, V>,

    /// Flushes that produced a segment
    flush_count: u64,

    /// Compactions that rewrote the chain
    compaction_count: u64,
}

/// Point-in-time counters for an engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Distinct keys buffered in the MemTable (tombstones included)
    pub memtable_entries: usize,
    /// Tombstones buffered in the MemTable
    pub memtable_tombstones: usize,
    /// Segments in the chain
    pub segment_count: usize,
    /// Entries across all segments, obsolete versions included
    pub segment_entries: usize,
    /// Tombstones across all segments
    pub segment_tombstones: usize,
    pub flushes: u64,
    pub compactions: u64,
}

impl fmt::Display for EngineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "memtable: {} entries ({} tombstones), segments: {} holding {} entries ({} tombstones), flushes: {}, compactions: {}",
            self.memtable_entries,
            self.memtable_tombstones,
            self.segment_count,
            self.segment_entries,
            self.segment_tombstones,
            self.flushes,
            self.compactions
        )
    }
}

impl<K, V> Engine<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    /// Create an empty engine with the given config
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tracing::debug!(
            flush_threshold = config.flush_threshold,
            scope = ?config.compaction_scope,
            trigger = ?config.compaction_trigger,
            "Engine created"
        );

        Ok(Self {
            config,
            memtable: MemTable::new(),
            chain: SegmentChain::new(),
            flush_count: 0,
            compaction_count: 0,
        })
    }

    /// Create with a flush threshold (convenience method)
    ///
    /// Uses default config otherwise
    pub fn with_flush_threshold(flush_threshold: usize) -> Result<Self> {
        Self::new(Config::builder().flush_threshold(flush_threshold).build())
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers; only `Get` yields a value
    pub fn execute(&mut self, command: Command<K, V>) -> Result<Option<V>> {
        match command {
            Command::Get { key } => Ok(self.get(&key).cloned()),
            Command::Put { key, value } => {
                self.put(key, value)?;
                Ok(None)
            }
            Command::Delete { key } => {
                self.delete(key)?;
                Ok(None)
            }
            Command::Flush => {
                self.flush()?;
                Ok(None)
            }
            Command::Compact => {
                self.compact()?;
                Ok(None)
            }
        }
    }

    /// Get a value by key
    ///
    /// Search order:
    /// 1. MemTable (most recent writes); a tombstone here ends the search
    /// 2. Segments (newest to oldest); the first segment holding the key
    ///    decides, live or tombstone
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let value = self.lookup(key).and_then(Entry::as_value);
        tracing::trace!(found = value.is_some(), "get");
        value
    }

    /// True if `get` would return a value
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Newest entry for a key across all layers (tombstones included)
    fn lookup<Q>(&self, key: &Q) -> Option<&Entry<V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // Step 1: Check MemTable first (most recent data)
        if let Some(entry) = self.memtable.get(key) {
            return Some(entry);
        }

        // Step 2: Check segments (newest to oldest)
        self.chain.get(key)
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Write to MemTable
    /// 2. Flush if the MemTable reached the threshold
    pub fn put(&mut self, key: K, value: V) -> Result<()> {
        let new_size = self.memtable.put(key, value);
        tracing::trace!(memtable_entries = new_size, "put");

        self.flush_if_full(new_size)
    }

    /// Delete a key
    ///
    /// Steps:
    /// 1. Write tombstone to MemTable
    /// 2. Flush if the MemTable reached the threshold
    pub fn delete(&mut self, key: K) -> Result<()> {
        let new_size = self.memtable.delete(key);
        tracing::trace!(memtable_entries = new_size, "delete");

        self.flush_if_full(new_size)
    }

    fn flush_if_full(&mut self, memtable_size: usize) -> Result<()> {
        if memtable_size >= self.config.flush_threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// Flush the MemTable into a new segment at the head of the chain
    ///
    /// No-op on an empty MemTable. Runs compaction afterwards if the
    /// configured trigger is met.
    pub fn flush(&mut self) -> Result<()> {
        if self.flush_internal()? {
            self.compact_if_due()?;
        }
        Ok(())
    }

    /// Internal flush implementation; returns whether a segment was created
    fn flush_internal(&mut self) -> Result<bool> {
        // Skip if memtable is empty
        if self.memtable.is_empty() {
            return Ok(false);
        }

        // Step 1: Take the sorted content (memtable is empty afterwards)
        let entries = self.memtable.drain()?;

        // Step 2: Freeze it as the newest segment
        let segment = Segment::from_sorted(self.chain.allocate_id(), entries);
        tracing::debug!(
            segment_id = segment.id(),
            entries = segment.len(),
            tombstones = segment.tombstone_count(),
            chain_len = self.chain.len() + 1,
            "MemTable flushed"
        );
        self.chain.push_newest(segment);
        self.flush_count += 1;

        Ok(true)
    }

    fn compact_if_due(&mut self) -> Result<()> {
        if let CompactionTrigger::SegmentCount(max_segments) = self.config.compaction_trigger {
            if self.chain.len() >= max_segments {
                tracing::debug!(
                    segments = self.chain.len(),
                    max_segments,
                    "Compaction triggered by segment count"
                );
                self.compact()?;
            }
        }
        Ok(())
    }

    /// Merge all sources into at most one segment
    ///
    /// Sources are every segment plus, under
    /// [`CompactionScope::IncludeMemtable`], the MemTable. Only the newest
    /// live version of each key survives. The chain is replaced only after
    /// the merged segment is fully built; when the MemTable took part it
    /// is reset to empty.
    pub fn compact(&mut self) -> Result<CompactionStats> {
        let include_memtable = self.config.compaction_scope == CompactionScope::IncludeMemtable
            && !self.memtable.is_empty();

        // Nothing to merge, or a single segment with nothing to reclaim
        if !include_memtable && self.chain.len() <= 1 && self.chain.total_tombstones() == 0 {
            tracing::debug!(segments = self.chain.len(), "Compaction skipped");
            return Ok(CompactionStats::default());
        }

        // Step 1: Gather sources newest → oldest and merge
        let output = {
            let mut sources: Vec<Source<'_, K, V>> = Vec::new();
            sources.try_reserve_exact(self.chain.len() + 1)?;
            if include_memtable {
                sources.push(Box::new(self.memtable.iter()));
            }
            for segment in self.chain.iter() {
                sources.push(Box::new(segment.iter().map(|(k, e)| (k, e))));
            }
            compaction::merge(sources)?
        };

        // Step 2: Install the merged result as the whole chain
        let merged = if output.entries.is_empty() {
            None
        } else {
            Some(Segment::from_sorted(self.chain.allocate_id(), output.entries))
        };
        let merged_id = merged.as_ref().map(Segment::id);
        let retired = self.chain.replace(merged);

        // Step 3: Reset the MemTable if it was merged
        if include_memtable {
            self.memtable.clear();
        }
        self.compaction_count += 1;

        tracing::debug!(
            retired_segments = retired.len(),
            merged_segment = ?merged_id,
            stats = %output.stats,
            "Compaction finished"
        );

        Ok(output.stats)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Snapshot of the engine's counters
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            memtable_entries: self.memtable.size(),
            memtable_tombstones: self.memtable.tombstone_count(),
            segment_count: self.chain.len(),
            segment_entries: self.chain.total_entries(),
            segment_tombstones: self.chain.total_tombstones(),
            flushes: self.flush_count,
            compactions: self.compaction_count,
        }
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.size()
    }

    /// Get the number of segments
    pub fn segment_count(&self) -> usize {
        self.chain.len()
    }

    pub fn memtable(&self) -> &MemTable<K, V> {
        &self.memtable
    }

    pub fn chain(&self) -> &SegmentChain<K, V> {
        &self.chain
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

// =============================================================================
// Snapshot / Restore
// =============================================================================

impl<K, V> Engine<K, V>
where
    K: Ord + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Encode the visible state as a single segment image
    ///
    /// Merges the MemTable and every segment without modifying the engine;
    /// the image holds exactly the keys `get` currently resolves.
    pub fn snapshot(&self) -> Result<Bytes> {
        let mut sources: Vec<Source<'_, K, V>> = Vec::new();
        sources.try_reserve_exact(self.chain.len() + 1)?;
        sources.push(Box::new(self.memtable.iter()));
        for segment in self.chain.iter() {
            sources.push(Box::new(segment.iter().map(|(k, e)| (k, e))));
        }
        let output = compaction::merge(sources)?;

        let image = Segment::from_sorted(0, output.entries).encode()?;
        tracing::debug!(
            entries = output.stats.entries_out,
            bytes = image.len(),
            "Snapshot encoded"
        );
        Ok(image)
    }

    /// Create an engine whose chain is the single segment in `image`
    pub fn restore(config: Config, image: &[u8]) -> Result<Self> {
        let mut engine = Self::new(config)?;

        let segment = Segment::decode(engine.chain.allocate_id(), image)?;
        tracing::debug!(
            segment_id = segment.id(),
            entries = segment.len(),
            "Snapshot restored"
        );
        if !segment.is_empty() {
            engine.chain.push_newest(segment);
        }

        Ok(engine)
    }
}

// =============================================================================
// Dump
// =============================================================================

impl<K, V> fmt::Display for Engine<K, V>
where
    K: Ord + fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== MemTable (size: {}) ===", self.memtable.size())?;
        write_entries(f, &self.memtable)?;

        writeln!(f, "=== Segments (count: {}) ===", self.chain.len())?;
        for segment in self.chain.iter() {
            write!(f, "Segment #{} (size: {}): ", segment.id(), segment.len())?;
            write_entries(f, segment.iter().map(|(k, e)| (k, e)))?;
        }
        Ok(())
    }
}

fn write_entries<'a, K, V, I>(f: &mut fmt::Formatter<'_>, entries: I) -> fmt::Result
where
    K: fmt::Debug + 'a,
    V: fmt::Debug + 'a,
    I: IntoIterator<Item = (&'a K, &'a Entry<V>)>,
{
    for (key, entry) in entries {
        match entry {
            Entry::Value(value) => write!(f, "[Key: {:?}, Value: {:?}, VALID] ", key, value)?,
            Entry::Tombstone => write!(f, "[Key: {:?}, TOMBSTONE] ", key)?,
        }
    }
    writeln!(f)
}
