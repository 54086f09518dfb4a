//! Compaction
//!
//! Merges every version of every key across a set of sources into one
//! sorted run:
//! 1. Keep only the most recent version of each key
//! 2. Drop keys whose most recent version is a tombstone
//!
//! Sources are passed newest first. Each entry is tagged with its source
//! rank (0 = newest) and the merge sorts by `(key, rank)`, so the winner
//! for a key never depends on sort stability or on value comparison.

use std::fmt;

use crate::error::Result;
use crate::memtable::Entry;

/// Counters describing one compaction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionStats {
    /// Sources that contributed at least one entry
    pub sources: usize,
    /// Entries read across all sources
    pub entries_in: usize,
    /// Live entries written to the merged segment
    pub entries_out: usize,
    /// Older versions shadowed by a newer source
    pub obsolete_dropped: usize,
    /// Keys whose newest version was a tombstone
    pub tombstones_dropped: usize,
}

impl CompactionStats {
    /// True if the run did not merge anything
    pub fn is_noop(&self) -> bool {
        self.sources == 0
    }
}

impl fmt::Display for CompactionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sources, {} entries in, {} out ({} obsolete, {} tombstones dropped)",
            self.sources,
            self.entries_in,
            self.entries_out,
            self.obsolete_dropped,
            self.tombstones_dropped
        )
    }
}

/// Result of merging a set of sources
#[derive(Debug)]
pub struct MergeOutput<K, V> {
    /// Surviving live entries, strictly ascending by key
    pub entries: Vec<(K, Entry<V>)>,
    pub stats: CompactionStats,
}

/// Merge sources ordered newest first into one ascending run of live entries
///
/// Sources are borrowed; survivors are cloned into the output, so a failed
/// merge leaves every source untouched.
pub fn merge<'a, K, V, S, I>(sources: S) -> Result<MergeOutput<K, V>>
where
    K: Ord + Clone + 'a,
    V: Clone + 'a,
    S: IntoIterator<Item = I>,
    I: IntoIterator<Item = (&'a K, &'a Entry<V>)>,
{
    let mut stats = CompactionStats::default();

    // Step 1: Collect every entry tagged with its source rank
    let mut tagged: Vec<(&'a K, usize, &'a Entry<V>)> = Vec::new();
    for (rank, source) in sources.into_iter().enumerate() {
        let before = tagged.len();
        for (key, entry) in source {
            tagged.try_reserve(1)?;
            tagged.push((key, rank, entry));
        }
        if tagged.len() > before {
            stats.sources += 1;
        }
    }
    stats.entries_in = tagged.len();

    // Step 2: Order by key, newest source first within a key
    tagged.sort_unstable_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)));

    // Step 3: Keep the first version of each key, drop tombstones
    let mut entries = Vec::new();
    let mut last_key: Option<&K> = None;
    for (key, _rank, entry) in tagged {
        if last_key == Some(key) {
            stats.obsolete_dropped += 1;
            continue;
        }
        last_key = Some(key);

        match entry {
            Entry::Value(value) => {
                entries.try_reserve(1)?;
                entries.push((key.clone(), Entry::Value(value.clone())));
            }
            Entry::Tombstone => stats.tombstones_dropped += 1,
        }
    }
    stats.entries_out = entries.len();

    Ok(MergeOutput { entries, stats })
}
