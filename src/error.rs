//! Error types for SoundKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using SoundKvError
pub type Result<T> = std::result::Result<T, SoundKvError>;

/// Unified error type for SoundKV operations
#[derive(Debug, Error)]
pub enum SoundKvError {
    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Malformed data: {0}")]
    MalformedData(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Data directory is locked by another store: {0}")]
    Locked(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Pub/Sub Errors
    // -------------------------------------------------------------------------
    #[error("Disconnected: {0}")]
    Disconnected(String),
}

impl From<bincode::Error> for SoundKvError {
    fn from(e: bincode::Error) -> Self {
        SoundKvError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for SoundKvError {
    fn from(e: serde_json::Error) -> Self {
        SoundKvError::Serialization(e.to_string())
    }
}
