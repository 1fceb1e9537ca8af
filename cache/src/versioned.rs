//! Fail-open cache-aside with version tokens.
//!
//! Group invalidation works without key enumeration: every key embeds the
//! current value of its group's version token, and a write bumps the token.
//! Entries built under the old version are never read again and age out
//! through their TTL.
//!
//! No method here returns a backend error. A backend failure degrades to a
//! cache miss (reads), a skipped write (writes) or the default token.

use crate::store::KeyValueStore;
use rand::Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

/// Token value assumed when none is stored.
pub const DEFAULT_TOKEN: i64 = 1;

/// How a `get_or_set` result is written back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Store a `null` result too (negative caching)
    pub cache_absent: bool,
    /// Maximum random offset applied to the TTL in either direction
    pub jitter: Duration,
}

impl CacheOptions {
    /// Options with the given jitter and no negative caching.
    #[must_use]
    pub const fn jittered(jitter: Duration) -> Self {
        Self {
            cache_absent: false,
            jitter,
        }
    }

    /// Enable negative caching.
    #[must_use]
    pub const fn cache_absent(mut self) -> Self {
        self.cache_absent = true;
        self
    }
}

/// `ttl` shifted by a uniform offset in `[-jitter, +jitter]`.
///
/// Falls back to `ttl` when the shifted value is not strictly positive.
#[must_use]
pub fn jittered_ttl<R: Rng>(ttl: Duration, jitter: Duration, rng: &mut R) -> Duration {
    let Ok(jitter_ms) = i64::try_from(jitter.as_millis()) else {
        return ttl;
    };
    if jitter_ms == 0 {
        return ttl;
    }
    let Ok(ttl_ms) = i64::try_from(ttl.as_millis()) else {
        return ttl;
    };

    let shifted = ttl_ms.saturating_add(rng.gen_range(-jitter_ms..=jitter_ms));
    match u64::try_from(shifted) {
        Ok(ms) if ms > 0 => Duration::from_millis(ms),
        _ => ttl,
    }
}

/// Typed, fail-open cache over a [`KeyValueStore`].
///
/// Values are stored as JSON. Clones share the same backend connection.
#[derive(Debug, Clone)]
pub struct VersionedCache<S> {
    store: S,
}

impl<S: KeyValueStore> VersionedCache<S> {
    /// Wrap a backend.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying backend.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Read and decode a value. Backend errors and undecodable payloads are
    /// misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                metrics::counter!("hydra_cache_errors_total", "op" => "get").increment(1);
                tracing::warn!(key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                metrics::counter!("hydra_cache_errors_total", "op" => "decode").increment(1);
                tracing::warn!(key, error = %e, "Undecodable cache entry, treating as miss");
                None
            }
        }
    }

    /// Encode and write a value. Failures are logged and swallowed.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(payload) => self.write(key, &payload, ttl).await,
            Err(e) => {
                metrics::counter!("hydra_cache_errors_total", "op" => "encode").increment(1);
                tracing::warn!(key, error = %e, "Could not encode cache value");
            }
        }
    }

    /// Delete a key.
    ///
    /// Returns `true` only if a key was actually removed.
    pub async fn remove(&self, key: &str) -> bool {
        match self.store.remove(key).await {
            Ok(removed) => removed,
            Err(e) => {
                metrics::counter!("hydra_cache_errors_total", "op" => "remove").increment(1);
                tracing::warn!(key, error = %e, "Cache remove failed");
                false
            }
        }
    }

    /// Cache-aside read.
    ///
    /// On a hit `load` is not called. On a miss (or backend error) `load` runs
    /// exactly once and its value is returned whatever the write-back does.
    /// The value is written back when it serializes to something other than
    /// `null`, or always when [`CacheOptions::cache_absent`] is set. Concurrent
    /// misses on the same key each run their own `load`.
    ///
    /// # Errors
    ///
    /// Returns whatever `load` fails with; nothing is cached in that case.
    pub async fn get_or_set<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        options: CacheOptions,
        load: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(key).await {
            metrics::counter!("hydra_cache_hits_total").increment(1);
            tracing::debug!(key, "Cache hit");
            return Ok(hit);
        }

        metrics::counter!("hydra_cache_misses_total").increment(1);
        tracing::debug!(key, "Cache miss");

        let value = load().await?;

        match serde_json::to_string(&value) {
            Ok(payload) if payload != "null" || options.cache_absent => {
                let ttl = jittered_ttl(ttl, options.jitter, &mut rand::thread_rng());
                self.write(key, &payload, ttl).await;
            }
            Ok(_) => {}
            Err(e) => {
                metrics::counter!("hydra_cache_errors_total", "op" => "encode").increment(1);
                tracing::warn!(key, error = %e, "Could not encode loaded value");
            }
        }

        Ok(value)
    }

    /// Current value of a version token, or `default` when absent,
    /// unparsable or unreadable.
    pub async fn get_token_or(&self, key: &str, default: i64) -> i64 {
        match self.store.get(key).await {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(key, raw = %raw, "Version token is not an integer");
                default
            }),
            Ok(None) => default,
            Err(e) => {
                metrics::counter!("hydra_cache_errors_total", "op" => "token").increment(1);
                tracing::warn!(key, error = %e, "Version token read failed, using default");
                default
            }
        }
    }

    /// Current value of a version token, defaulting to [`DEFAULT_TOKEN`].
    pub async fn get_token(&self, key: &str) -> i64 {
        self.get_token_or(key, DEFAULT_TOKEN).await
    }

    /// Atomically increment a version token and return the new value.
    ///
    /// An absent token counts as [`DEFAULT_TOKEN`], so the first bump always
    /// moves readers to a new key. On backend failure this returns the
    /// current readable value instead.
    pub async fn bump_token(&self, key: &str) -> i64 {
        match self.store.increment(key, DEFAULT_TOKEN).await {
            Ok(version) => {
                metrics::counter!("hydra_cache_token_bumps_total").increment(1);
                tracing::debug!(key, version, "Version token bumped");
                version
            }
            Err(e) => {
                metrics::counter!("hydra_cache_errors_total", "op" => "bump").increment(1);
                tracing::warn!(key, error = %e, "Version token bump failed");
                self.get_token(key).await
            }
        }
    }

    /// Returns `true` if the backend answers.
    pub async fn ping(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Cache ping failed");
                false
            }
        }
    }

    async fn write(&self, key: &str, payload: &str, ttl: Duration) {
        if let Err(e) = self.store.set(key, payload, ttl).await {
            metrics::counter!("hydra_cache_errors_total", "op" => "set").increment(1);
            tracing::warn!(key, error = %e, "Cache write failed");
        }
    }
}
