//! # Hydra Cache
//!
//! A typed cache-aside layer in front of a shared key-value backend.
//!
//! - [`VersionedCache`]: JSON get/set/remove, `get_or_set` with jittered
//!   TTLs and optional negative caching, and integer version tokens for
//!   invalidating whole groups of keys at once.
//! - [`KeyValueStore`]: the backend seam, implemented by [`RedisStore`]
//!   and, behind the `test-utils` feature, [`InMemoryStore`].
//!
//! The cache is an accelerator, never a source of truth: every
//! [`VersionedCache`] method is fail-open.

pub mod error;
pub mod redis_store;
pub mod store;
pub mod versioned;

#[cfg(feature = "test-utils")]
pub mod memory;

pub use error::{CacheError, Result};
pub use redis_store::RedisStore;
pub use store::KeyValueStore;
pub use versioned::{CacheOptions, DEFAULT_TOKEN, VersionedCache, jittered_ttl};

#[cfg(feature = "test-utils")]
pub use memory::InMemoryStore;
