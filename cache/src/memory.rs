//! In-memory key-value store for testing.

use crate::error::{CacheError, Result};
use crate::store::KeyValueStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    ttl_log: Vec<(String, Duration)>,
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-memory store.
///
/// Honours TTLs, records every TTL it was asked to apply, and can be
/// switched offline to simulate a backend outage. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
    offline: Arc<AtomicBool>,
    gets: Arc<AtomicUsize>,
    sets: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails with [`CacheError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Raw payload stored under `key`, ignoring expiry (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.entries.get(key).map(|e| e.value.clone()))
    }

    /// Every `(key, ttl)` passed to `set`, in call order (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn recorded_ttls(&self) -> Result<Vec<(String, Duration)>> {
        Ok(self.lock()?.ttl_log.clone())
    }

    /// Number of live keys (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        let now = Instant::now();
        Ok(self
            .lock()?
            .entries
            .values()
            .filter(|e| e.is_live(now))
            .count())
    }

    /// Returns `true` if no live keys are stored.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Number of `get` calls that reached the store.
    #[must_use]
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of successful `set` calls.
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| CacheError::Command("Mutex lock failed".to_string()))
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(CacheError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_online()?;
        self.gets.fetch_add(1, Ordering::SeqCst);

        let now = Instant::now();
        let mut inner = self.lock()?;
        match inner.entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                inner.entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.check_online()?;

        let mut inner = self.lock()?;
        inner.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        inner.ttl_log.push((key.to_string(), ttl));
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        self.check_online()?;

        let now = Instant::now();
        Ok(self
            .lock()?
            .entries
            .remove(key)
            .is_some_and(|e| e.is_live(now)))
    }

    async fn increment(&self, key: &str, initial: i64) -> Result<i64> {
        self.check_online()?;

        let now = Instant::now();
        let mut inner = self.lock()?;
        let current = match inner.entries.get(key) {
            Some(entry) if entry.is_live(now) => entry
                .value
                .parse::<i64>()
                .map_err(|_| CacheError::Command("value is not an integer".to_string()))?,
            _ => initial,
        };

        let next = current
            .checked_add(1)
            .ok_or_else(|| CacheError::Command("increment would overflow".to_string()))?;

        inner.entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at: None,
            },
        );
        Ok(next)
    }

    async fn ping(&self) -> Result<()> {
        self.check_online()
    }
}
