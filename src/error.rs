//! Error types for DriftKV
//!
//! Provides a unified error type for all operations. Read-side outcomes such as
//! "not found" and "corrupted" are not errors; see [`crate::engine::GetResult`].

use thiserror::Error;

/// Result type alias using DriftError
pub type Result<T> = std::result::Result<T, DriftError>;

/// Unified error type for DriftKV operations
#[derive(Debug, Error)]
pub enum DriftError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record Codec Errors
    // -------------------------------------------------------------------------
    #[error("Malformed header: expected {expected} bytes, got {actual}")]
    MalformedHeader { expected: usize, actual: usize },

    #[error("Malformed record: expected {expected} bytes, got {actual}")]
    MalformedRecord { expected: usize, actual: usize },

    #[error("Record too large: {field} is {size} bytes (max {})", u32::MAX)]
    RecordTooLarge { field: &'static str, size: usize },

    // -------------------------------------------------------------------------
    // Data File Errors
    // -------------------------------------------------------------------------
    #[error("Data file corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Key/Value Conversion Errors
    // -------------------------------------------------------------------------
    #[error("Unsupported type: {kind} (for {role})")]
    UnsupportedType {
        kind: &'static str,
        role: &'static str,
    },

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}
