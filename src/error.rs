//! Error types for lsmkv
//!
//! Provides a unified error type for all fallible operations. A missing
//! key is never an error: lookups return `None` for both absent and
//! deleted keys.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result type alias using LsmError
pub type Result<T> = std::result::Result<T, LsmError>;

/// Unified error type for lsmkv operations
#[derive(Debug, Error)]
pub enum LsmError {
    // -------------------------------------------------------------------------
    // Memory Errors
    // -------------------------------------------------------------------------
    #[error("Allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    // -------------------------------------------------------------------------
    // Segment Image Errors
    // -------------------------------------------------------------------------
    #[error("Segment image corrupted: {0}")]
    Corruption(String),

    #[error("Invalid segment: {0}")]
    InvalidSegment(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error("Parse error: {0}")]
    Parse(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for LsmError {
    fn from(err: bincode::Error) -> Self {
        LsmError::Serialization(err.to_string())
    }
}
