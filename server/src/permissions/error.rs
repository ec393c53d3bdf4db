//! Grant Store Error Types

use thiserror::Error;

/// Errors raised by the grant store.
#[derive(Debug, Error)]
pub enum GrantError {
    /// Durable write or read failed. In-memory state has been rolled back.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Ledger document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Duration is not a finite number of hours or overflows the calendar.
    #[error("Invalid duration: {0} hour(s)")]
    InvalidDuration(f64),
}

/// Grant store result type.
pub type Result<T> = std::result::Result<T, GrantError>;
