//! Application wiring.
//!
//! [`HydraApp`] owns one repository handle and one cache backend and hands
//! clones of them to the booking and venue services.

use crate::config::{Config, ConfigError};
use crate::service::BookingService;
use crate::venues::VenueService;
use hydra_cache::{CacheError, KeyValueStore, RedisStore, VersionedCache};
use hydra_core::{
    AvailabilityEngine, BookingRepository, Clock, CustomerRepository, StorageError, SystemClock,
    VenueRepository,
};
use hydra_postgres::PgRepository;
use std::sync::Arc;
use thiserror::Error;

/// Startup failures.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration was rejected.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Postgres could not be reached or migrated.
    #[error("Storage bootstrap failed: {0}")]
    Storage(#[from] StorageError),

    /// Redis could not be reached.
    #[error("Cache bootstrap failed: {0}")]
    Cache(#[from] CacheError),
}

/// The booking core, wired.
pub struct HydraApp<R, S> {
    /// Booking orchestrator
    pub bookings: BookingService<R, S>,
    /// Venue service
    pub venues: VenueService<R, S>,
    cache: VersionedCache<S>,
}

impl<R, S> HydraApp<R, S>
where
    R: VenueRepository + CustomerRepository + BookingRepository + Clone,
    S: KeyValueStore + Clone,
{
    /// Wire services over the given collaborators.
    #[must_use]
    pub fn new(repo: R, store: S, config: &Config, clock: Arc<dyn Clock>) -> Self {
        let cache = VersionedCache::new(store);
        let keys = config.cache.keys();
        let engine = AvailabilityEngine::new(config.availability.policy());

        Self {
            bookings: BookingService::new(repo.clone(), cache.clone(), keys.clone(), engine, clock),
            venues: VenueService::new(repo, cache.clone(), keys),
            cache,
        }
    }

    /// Returns `true` if the cache backend answers a ping. The services
    /// work either way; this is for health reporting.
    pub async fn cache_healthy(&self) -> bool {
        self.cache.ping().await
    }
}

impl HydraApp<PgRepository, RedisStore> {
    /// Connect to Postgres and Redis, apply migrations and wire the
    /// services with the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] if either backend is unreachable or a
    /// migration fails.
    pub async fn connect(config: &Config) -> Result<Self, BootstrapError> {
        let repo = PgRepository::connect_with(
            &config.postgres.url,
            config.postgres.max_connections,
            config.postgres.acquire_timeout(),
        )
        .await?;
        repo.migrate().await?;

        let store = RedisStore::new(&config.redis.url).await?;
        tracing::info!(namespace = %config.cache.namespace, "Hydra services ready");

        Ok(Self::new(repo, store, config, Arc::new(SystemClock)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hydra_cache::InMemoryStore;
    use hydra_core::Cancellation;
    use hydra_testing::{InMemoryRepository, fixtures, test_clock};

    fn config(namespace: &str) -> Config {
        let namespace = namespace.to_string();
        Config::from_lookup(move |key| (key == "CACHE_NAMESPACE").then(|| namespace.clone())).unwrap()
    }

    #[tokio::test]
    async fn services_share_namespace_and_backend() {
        let repo = InMemoryRepository::new();
        let store = InMemoryStore::new();
        let venue = fixtures::venue(8);
        repo.seed_venue(venue.clone()).unwrap();

        let app = HydraApp::new(repo, store.clone(), &config("tenant-a"), Arc::new(test_clock()));
        app.venues.get_venue(venue.id, &Cancellation::none()).await.unwrap();

        assert!(store.raw(&format!("tenant-a:venues:v1:{}", venue.id)).unwrap().is_some());
    }

    #[tokio::test]
    async fn cache_health_follows_backend() {
        let store = InMemoryStore::new();
        let app = HydraApp::new(
            InMemoryRepository::new(),
            store.clone(),
            &config("hb"),
            Arc::new(test_clock()),
        );

        assert!(app.cache_healthy().await);
        store.set_offline(true);
        assert!(!app.cache_healthy().await);
    }
}
