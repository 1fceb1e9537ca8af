//! Key-value backend errors.
//!
//! These never leave [`crate::VersionedCache`]; they exist so backends can
//! report what went wrong for the log line.

use thiserror::Error;

/// Result type alias for backend calls.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Failure talking to the key-value backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Could not reach the backend.
    #[error("Cache connection failed: {0}")]
    Connection(String),

    /// Backend rejected or failed a command.
    #[error("Cache command failed: {0}")]
    Command(String),

    /// Backend deliberately offline (test store outage switch).
    #[error("Cache backend unavailable")]
    Unavailable,
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_timeout() {
            Self::Connection(err.to_string())
        } else {
            Self::Command(err.to_string())
        }
    }
}
