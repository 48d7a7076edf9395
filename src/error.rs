//! Error types for photo-date

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for photo-date operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for photo-date
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read metadata from {path}: {message}")]
    ExifRead { path: PathBuf, message: String },

    #[error("Failed to determine date of {path}")]
    NoDate { path: PathBuf },

    /// The single-byte text view does not cover the file one unit per byte
    #[error("Failed to read binary data of {path}: {expected} bytes on disk, {actual} read")]
    Encoding {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Bytes at a patch target differ from what the scan saw
    #[error("Integrity check failed for {path} at offset {offset}: expected {expected:?}, found {found:?}")]
    Integrity {
        path: PathBuf,
        offset: u64,
        expected: String,
        found: String,
    },

    #[error("Replacement {replacement:?} is {actual} bytes, target {original:?} is {expected}")]
    LengthMismatch {
        original: String,
        replacement: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Cannot represent {timestamp} as a local time: {message}")]
    Timestamp { timestamp: String, message: String },

    #[error("Failed to rename {path}: {message}")]
    Rename { path: PathBuf, message: String },
}

impl Error {
    /// Whether this error signals that the file on disk can no longer be trusted
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            Error::Integrity { .. } | Error::Encoding { .. }
        )
    }
}
