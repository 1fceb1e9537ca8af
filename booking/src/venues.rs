//! Venue service.
//!
//! Cache-aside reads over the `venues` token group. Every write bumps
//! `venues`; updates and deletes also bump `availability`, since capacity
//! and slot rules feed availability answers.

use crate::dto::VenueDto;
use crate::keys::{CacheGroup, CacheKeys, CacheKind};
use hydra_cache::{KeyValueStore, VersionedCache};
use hydra_core::{
    BookingError, Cancellation, EntityKind, Result, Venue, VenueDraft, VenueId, VenueRepository,
};

/// Venue service.
#[derive(Clone)]
pub struct VenueService<R, S> {
    repo: R,
    cache: VersionedCache<S>,
    keys: CacheKeys,
}

impl<R, S> VenueService<R, S>
where
    R: VenueRepository,
    S: KeyValueStore,
{
    /// Create a venue service.
    #[must_use]
    pub const fn new(repo: R, cache: VersionedCache<S>, keys: CacheKeys) -> Self {
        Self { repo, cache, keys }
    }

    /// Fetch one venue. Unknown IDs are cached as absent.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`] or a system error.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn get_venue(&self, id: VenueId, cancel: &Cancellation) -> Result<VenueDto> {
        let kind = CacheKind::VenueDetail;
        let version = self.cache.get_token(&self.keys.token_for(kind)).await;
        let key = self.keys.venue(version, id);
        let policy = kind.policy();
        let repo = &self.repo;

        let found: Option<VenueDto> = self
            .cache
            .get_or_set(&key, policy.ttl, policy.options().cache_absent(), || async move {
                let venue = cancel.run(repo.find_venue(id)).await??;
                Ok::<_, BookingError>(venue.as_ref().map(VenueDto::from))
            })
            .await?;

        found.ok_or_else(|| BookingError::not_found(EntityKind::Venue, id))
    }

    /// All venues, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a system error if persistence fails.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn list_venues(&self, cancel: &Cancellation) -> Result<Vec<VenueDto>> {
        let kind = CacheKind::VenueList;
        let version = self.cache.get_token(&self.keys.token_for(kind)).await;
        let key = self.keys.venue_list(version);
        let policy = kind.policy();
        let repo = &self.repo;

        self.cache
            .get_or_set(&key, policy.ttl, policy.options(), || async move {
                let venues = cancel.run(repo.list_venues()).await??;
                Ok::<_, BookingError>(venues.iter().map(VenueDto::from).collect())
            })
            .await
    }

    /// Register a venue.
    ///
    /// # Errors
    ///
    /// [`BookingError::InvalidArgument`] for a blank name, zero capacity or
    /// zero slot length, or a system error.
    #[tracing::instrument(skip(self, draft, cancel), fields(name = %draft.name))]
    pub async fn create_venue(&self, draft: VenueDraft, cancel: &Cancellation) -> Result<Venue> {
        validate(&draft)?;

        let venue = draft.into_venue(VenueId::new());
        cancel.run(self.repo.insert_venue(&venue)).await??;
        self.cache.bump_token(&self.keys.token(CacheGroup::Venues)).await;

        tracing::info!(venue_id = %venue.id, "Venue created");
        Ok(venue)
    }

    /// Replace a venue's details.
    ///
    /// # Errors
    ///
    /// [`BookingError::InvalidArgument`], [`BookingError::NotFound`], or a
    /// system error.
    #[tracing::instrument(skip(self, draft, cancel))]
    pub async fn update_venue(
        &self,
        id: VenueId,
        draft: VenueDraft,
        cancel: &Cancellation,
    ) -> Result<Venue> {
        validate(&draft)?;

        let venue = draft.into_venue(id);
        if !cancel.run(self.repo.update_venue(&venue)).await?? {
            return Err(BookingError::not_found(EntityKind::Venue, id));
        }
        self.invalidate().await;

        tracing::info!("Venue updated");
        Ok(venue)
    }

    /// Remove a venue.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`], or a system error (including a venue that
    /// still has bookings).
    #[tracing::instrument(skip(self, cancel))]
    pub async fn delete_venue(&self, id: VenueId, cancel: &Cancellation) -> Result<()> {
        if !cancel.run(self.repo.delete_venue(id)).await?? {
            return Err(BookingError::not_found(EntityKind::Venue, id));
        }
        self.invalidate().await;

        tracing::info!("Venue deleted");
        Ok(())
    }

    async fn invalidate(&self) {
        let venues = self.keys.token(CacheGroup::Venues);
        let availability = self.keys.token(CacheGroup::Availability);
        tokio::join!(
            self.cache.bump_token(&venues),
            self.cache.bump_token(&availability),
        );
    }
}

fn validate(draft: &VenueDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(BookingError::InvalidArgument("Venue name is required".to_string()));
    }
    if draft.capacity == 0 {
        return Err(BookingError::InvalidArgument(
            "Capacity must be greater than 0".to_string(),
        ));
    }
    if draft.rules.is_some_and(|r| r.slot_minutes == 0) {
        return Err(BookingError::InvalidArgument(
            "Slot length must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hydra_cache::InMemoryStore;
    use hydra_core::BookingRules;
    use hydra_testing::InMemoryRepository;

    fn draft(name: &str, capacity: u32) -> VenueDraft {
        VenueDraft {
            owner_id: None,
            name: name.to_string(),
            address: "1 Quay Street".to_string(),
            capacity,
            rules: Some(BookingRules::default()),
        }
    }

    fn service(repo: &InMemoryRepository, store: &InMemoryStore) -> VenueService<InMemoryRepository, InMemoryStore> {
        VenueService::new(repo.clone(), VersionedCache::new(store.clone()), CacheKeys::default())
    }

    #[tokio::test]
    async fn invalid_drafts_write_nothing() {
        let repo = InMemoryRepository::new();
        let store = InMemoryStore::new();
        let service = service(&repo, &store);
        let none = Cancellation::none();

        let mut zero_slot = draft("Pier 4", 10);
        zero_slot.rules = Some(BookingRules {
            slot_minutes: 0,
            auto_confirm: false,
        });

        for bad in [draft("  ", 10), draft("Pier 4", 0), zero_slot] {
            let err = service.create_venue(bad, &none).await.unwrap_err();
            assert!(matches!(err, BookingError::InvalidArgument(_)));
        }
        assert_eq!(repo.write_count(), 0);
        assert_eq!(store.raw("hb:venues:ver").unwrap(), None);
    }

    #[tokio::test]
    async fn create_bumps_only_venues() {
        let repo = InMemoryRepository::new();
        let store = InMemoryStore::new();

        service(&repo, &store)
            .create_venue(draft("Pier 4", 10), &Cancellation::none())
            .await
            .unwrap();

        assert_eq!(store.raw("hb:venues:ver").unwrap().as_deref(), Some("2"));
        assert_eq!(store.raw("hb:availability:ver").unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_venue_is_cached_as_absent() {
        let repo = InMemoryRepository::new();
        let store = InMemoryStore::new();
        let service = service(&repo, &store);
        let id = VenueId::new();

        for _ in 0..3 {
            let err = service.get_venue(id, &Cancellation::none()).await.unwrap_err();
            assert!(matches!(err, BookingError::NotFound { entity: EntityKind::Venue, .. }));
        }
        assert_eq!(repo.venue_read_count(), 1);
    }

    #[tokio::test]
    async fn update_and_delete_missing_venue() {
        let repo = InMemoryRepository::new();
        let store = InMemoryStore::new();
        let service = service(&repo, &store);
        let id = VenueId::new();

        let err = service
            .update_venue(id, draft("Pier 4", 10), &Cancellation::none())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound { .. }));

        let err = service.delete_venue(id, &Cancellation::none()).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound { .. }));
        assert_eq!(store.raw("hb:availability:ver").unwrap(), None);
    }

    #[tokio::test]
    async fn detail_entries_use_the_venue_detail_policy() {
        let repo = InMemoryRepository::new();
        let store = InMemoryStore::new();
        let service = service(&repo, &store);
        let policy = CacheKind::VenueDetail.policy();

        for _ in 0..200 {
            let _ = service.get_venue(VenueId::new(), &Cancellation::none()).await;
        }

        let ttls = store.recorded_ttls().unwrap();
        assert_eq!(ttls.len(), 200);
        for (key, ttl) in &ttls {
            assert!(key.starts_with("hb:venues:v1:"), "{key}");
            assert!(*ttl >= policy.ttl - policy.jitter, "{key}: {ttl:?}");
            assert!(*ttl <= policy.ttl + policy.jitter, "{key}: {ttl:?}");
        }
        assert!(ttls.iter().any(|(_, ttl)| *ttl != ttls[0].1));
    }
}
