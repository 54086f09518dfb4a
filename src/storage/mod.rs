//! Storage Module
//!
//! Immutable sorted segments and the newest-first chain that owns them.
//!
//! ## Responsibilities
//! - Freeze flushed MemTable content into read-only segments
//! - Point lookups by binary search within a segment
//! - Newest → oldest resolution across the chain
//! - Flat byte images of segments (see [`codec`])
//!
//! ## Layout
//! ```text
//!   head (newest)                               tail (oldest)
//!   ┌───────────┐   ┌───────────┐         ┌───────────┐
//!   │ Segment 7 │ → │ Segment 6 │ → ... → │ Segment 1 │
//!   └───────────┘   └───────────┘         └───────────┘
//!   each: [(key, Value | Tombstone)] strictly ascending
//! ```

mod chain;
pub mod codec;
mod segment;

pub use chain::SegmentChain;
pub use segment::Segment;
