//! Key-value backend trait.

use crate::error::Result;
use std::time::Duration;

/// String key-value backend with TTLs and atomic counters.
///
/// This trait abstracts over the shared cache backend (Redis in production).
///
/// # Implementation Notes
///
/// - Keys are opaque strings; values are serialized payloads
/// - `increment` must be atomic across every process sharing the backend
/// - No client-side locking is expected
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be reached.
    fn get(&self, key: &str) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// Write a value that expires after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be reached.
    fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Delete a key.
    ///
    /// # Returns
    ///
    /// `true` if a key was actually removed.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be reached.
    fn remove(&self, key: &str) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Atomically increment a counter and return the new value.
    ///
    /// An absent counter is treated as holding `initial`, so the first
    /// increment returns `initial + 1`.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be reached or the stored value
    /// is not an integer.
    fn increment(
        &self,
        key: &str,
        initial: i64,
    ) -> impl std::future::Future<Output = Result<i64>> + Send;

    /// Check the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be reached.
    fn ping(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}
