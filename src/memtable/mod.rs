//! MemTable Module
//!
//! In-memory buffer for the newest, not-yet-flushed writes.
//!
//! ## Responsibilities
//! - Ordered insertion and lookup by key
//! - Last-write-wins for repeated keys
//! - Track distinct key count for flush triggers
//! - Hand its sorted content to a new segment on flush
//!
//! ## Data Structure Choice
//! A `BTreeMap` keeps keys ascending at rest, so the sortedness invariant
//! holds by construction and `drain` yields segment-ready order.

mod table;

pub use table::MemTable;

use serde::{Deserialize, Serialize};

/// Entry stored in the MemTable and in segments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entry<V> {
    /// A live value
    Value(V),

    /// A tombstone (deleted key)
    Tombstone,
}

impl<V> Entry<V> {
    /// True if this entry marks a deletion
    pub fn is_tombstone(&self) -> bool {
        matches!(self, Entry::Tombstone)
    }

    /// The live value, or `None` for a tombstone
    pub fn as_value(&self) -> Option<&V> {
        match self {
            Entry::Value(value) => Some(value),
            Entry::Tombstone => None,
        }
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            Entry::Value(value) => Some(value),
            Entry::Tombstone => None,
        }
    }
}
