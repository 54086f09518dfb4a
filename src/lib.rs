//! # lsmkv
//!
//! An in-memory log-structured merge (LSM) key-value engine with:
//! - A sorted MemTable for the newest writes
//! - Immutable sorted segments produced by flushes
//! - Tombstone deletion with newest-first read precedence
//! - Compaction that collapses every source into one segment
//!
//! ## Architecture Overview
//!
//! ```text
//!            put / delete                       get
//!                 │                              │
//! ┌───────────────▼──────────────┐               │
//! │           MemTable           │◄──────────────┤ 1. newest
//! │   (BTreeMap, last write wins)│               │
//! └───────────────┬──────────────┘               │
//!                 │ flush (size >= threshold)    │
//! ┌───────────────▼──────────────┐               │
//! │        Segment Chain         │◄──────────────┘ 2. head → tail
//! │  [newest] → ... → [oldest]   │
//! └───────────────┬──────────────┘
//!                 │ compact
//!                 ▼
//!        one merged segment (live entries only)
//! ```
//!
//! ## Example
//!
//! ```
//! use lsmkv::Engine;
//!
//! let mut engine = Engine::with_flush_threshold(2).unwrap();
//! engine.put(1, "one").unwrap();
//! engine.put(2, "two").unwrap(); // reaches the threshold, flushes
//! engine.delete(1).unwrap();
//!
//! assert_eq!(engine.get(&1), None);
//! assert_eq!(engine.get(&2), Some(&"two"));
//!
//! engine.compact().unwrap();
//! assert_eq!(engine.segment_count(), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod memtable;
pub mod storage;
pub mod compaction;
pub mod command;
pub mod engine;
pub mod shared;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LsmError, Result};
pub use config::{CompactionScope, CompactionTrigger, Config};
pub use compaction::CompactionStats;
pub use command::Command;
pub use engine::{Engine, EngineStats};
pub use memtable::Entry;
pub use shared::SharedEngine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of lsmkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
