//! Configuration for lsmkv
//!
//! Centralized configuration with sensible defaults.

use crate::error::{LsmError, Result};

/// Number of distinct keys the memtable holds before an automatic flush
pub const DEFAULT_FLUSH_THRESHOLD: usize = 5;

/// Main configuration for an engine instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Distinct keys the memtable may hold before a flush is triggered.
    /// Tombstones count as keys.
    pub flush_threshold: usize,

    // -------------------------------------------------------------------------
    // Compaction Configuration
    // -------------------------------------------------------------------------
    /// Which sources a compaction merges
    pub compaction_scope: CompactionScope,

    /// When compaction runs without being asked
    pub compaction_trigger: CompactionTrigger,
}

/// Sources merged by a compaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompactionScope {
    /// Merge the memtable together with every segment, then reset the memtable
    #[default]
    IncludeMemtable,

    /// Merge only the segment chain; the memtable is left untouched
    SegmentsOnly,
}

/// Policy for running compaction automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompactionTrigger {
    /// Only explicit `compact()` calls
    #[default]
    Manual,

    /// Compact after a flush leaves at least this many segments in the chain
    SegmentCount(usize),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            compaction_scope: CompactionScope::default(),
            compaction_trigger: CompactionTrigger::default(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the configuration can drive an engine
    pub fn validate(&self) -> Result<()> {
        if self.flush_threshold == 0 {
            return Err(LsmError::Config(
                "flush_threshold must be at least 1".to_string(),
            ));
        }
        if let CompactionTrigger::SegmentCount(0) = self.compaction_trigger {
            return Err(LsmError::Config(
                "compaction segment count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the memtable flush threshold (distinct keys)
    pub fn flush_threshold(mut self, keys: usize) -> Self {
        self.config.flush_threshold = keys;
        self
    }

    /// Set which sources compaction merges
    pub fn compaction_scope(mut self, scope: CompactionScope) -> Self {
        self.config.compaction_scope = scope;
        self
    }

    /// Set the automatic compaction policy
    pub fn compaction_trigger(mut self, trigger: CompactionTrigger) -> Self {
        self.config.compaction_trigger = trigger;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
