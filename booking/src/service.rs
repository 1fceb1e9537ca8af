//! Booking orchestrator.
//!
//! Validates requests, enforces capacity and overlap rules, drives the
//! lifecycle, persists, and keeps the cache coherent by bumping version
//! tokens after every successful write.
//!
//! Reads go through [`VersionedCache::get_or_set`]; the cached values are
//! the boundary DTOs.

use crate::dto::{AvailabilityDto, BookingDto};
use crate::keys::{CacheGroup, CacheKeys, CacheKind};
use chrono::NaiveDate;
use hydra_cache::{KeyValueStore, VersionedCache};
use hydra_core::lifecycle::{self, BookingAction, Decision};
use hydra_core::{
    AvailabilityEngine, Booking, BookingError, BookingFilter, BookingId, BookingRepository,
    BookingStatus, Cancellation, Clock, CustomerRepository, EntityKind, NewBooking, Result,
    VenueId, VenueRepository,
};
use std::sync::Arc;

/// Booking service.
///
/// Cheap to clone when `R` and `S` are; clones share the repository, the
/// cache backend and the clock.
#[derive(Clone)]
pub struct BookingService<R, S> {
    repo: R,
    cache: VersionedCache<S>,
    keys: CacheKeys,
    engine: AvailabilityEngine,
    clock: Arc<dyn Clock>,
}

impl<R, S> BookingService<R, S>
where
    R: VenueRepository + CustomerRepository + BookingRepository,
    S: KeyValueStore,
{
    /// Create a booking service.
    #[must_use]
    pub fn new(
        repo: R,
        cache: VersionedCache<S>,
        keys: CacheKeys,
        engine: AvailabilityEngine,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            cache,
            keys,
            engine,
            clock,
        }
    }

    /// The availability engine in use.
    #[must_use]
    pub const fn engine(&self) -> &AvailabilityEngine {
        &self.engine
    }

    // ═══════════════════════════════════════════════════════════
    // Writes
    // ═══════════════════════════════════════════════════════════

    /// Request a booking.
    ///
    /// The booking starts `Pending`, or `Confirmed` when the venue
    /// auto-confirms.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidArgument`] for an empty interval or an empty
    ///   party, before any I/O
    /// - [`BookingError::NotFound`] if the venue or customer does not exist
    /// - [`BookingError::CapacityExceeded`] if the party does not fit
    /// - [`BookingError::SlotConflict`] if an occupying booking overlaps
    /// - [`BookingError::Cancelled`] / [`BookingError::Storage`]
    #[tracing::instrument(
        skip(self, request, cancel),
        fields(venue_id = %request.venue_id, customer_id = %request.customer_id)
    )]
    pub async fn create_booking(&self, request: NewBooking, cancel: &Cancellation) -> Result<Booking> {
        if request.end_utc <= request.start_utc {
            return Err(BookingError::InvalidArgument(
                "Start time must be before end time".to_string(),
            ));
        }
        if request.party_size == 0 {
            return Err(BookingError::InvalidArgument(
                "Party size must be greater than 0".to_string(),
            ));
        }

        let venue = cancel
            .run(self.repo.find_venue(request.venue_id))
            .await??
            .ok_or_else(|| BookingError::not_found(EntityKind::Venue, request.venue_id))?;

        cancel
            .run(self.repo.find_customer(request.customer_id))
            .await??
            .ok_or_else(|| BookingError::not_found(EntityKind::Customer, request.customer_id))?;

        if request.party_size > venue.capacity {
            return Err(BookingError::CapacityExceeded {
                party_size: request.party_size,
                capacity: venue.capacity,
            });
        }

        let blocking = self.engine.policy().occupancy.blocking_statuses();
        let clashes = cancel
            .run(self.repo.find_bookings_overlapping(
                venue.id,
                request.start_utc,
                request.end_utc,
                blocking,
            ))
            .await??;
        if !clashes.is_empty() {
            tracing::debug!(clashes = clashes.len(), "Requested interval is occupied");
            return Err(BookingError::SlotConflict {
                venue_id: venue.id,
                start_utc: request.start_utc,
                end_utc: request.end_utc,
            });
        }

        let initial = if venue.auto_confirms() {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        };
        let booking = request.into_booking(initial, self.clock.now());

        cancel.run(self.repo.insert_booking(&booking)).await??;
        self.invalidate().await;

        tracing::info!(booking_id = %booking.id, status = %booking.status, "Booking created");
        Ok(booking)
    }

    /// Confirm a pending booking.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`], [`BookingError::InvalidState`] unless the
    /// booking is `Pending`, or a system error.
    pub async fn confirm_booking(
        &self,
        id: BookingId,
        decision: &Decision,
        cancel: &Cancellation,
    ) -> Result<Booking> {
        self.transition(id, BookingAction::Confirm, decision, cancel).await
    }

    /// Decline a pending booking.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`], [`BookingError::InvalidState`] unless the
    /// booking is `Pending`, or a system error.
    pub async fn decline_booking(
        &self,
        id: BookingId,
        decision: &Decision,
        cancel: &Cancellation,
    ) -> Result<Booking> {
        self.transition(id, BookingAction::Decline, decision, cancel).await
    }

    /// Cancel a confirmed booking.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`], [`BookingError::InvalidState`] unless the
    /// booking is `Confirmed`, or a system error.
    pub async fn cancel_booking(
        &self,
        id: BookingId,
        decision: &Decision,
        cancel: &Cancellation,
    ) -> Result<Booking> {
        self.transition(id, BookingAction::Cancel, decision, cancel).await
    }

    /// Record that the party of a confirmed booking arrived.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`], [`BookingError::InvalidState`] unless the
    /// booking is `Confirmed`, or a system error.
    pub async fn mark_seated(
        &self,
        id: BookingId,
        decision: &Decision,
        cancel: &Cancellation,
    ) -> Result<Booking> {
        self.transition(id, BookingAction::MarkSeated, decision, cancel).await
    }

    /// Record that the party of a confirmed booking never arrived.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`], [`BookingError::InvalidState`] unless the
    /// booking is `Confirmed`, or a system error.
    pub async fn mark_no_show(
        &self,
        id: BookingId,
        decision: &Decision,
        cancel: &Cancellation,
    ) -> Result<Booking> {
        self.transition(id, BookingAction::MarkNoShow, decision, cancel).await
    }

    /// Load, guard, compare-and-set, invalidate.
    ///
    /// A lost compare-and-set means another writer moved the booking after
    /// we read it; the caller gets `InvalidState` with the status that won.
    #[tracing::instrument(skip(self, decision, cancel), fields(actor = %decision.actor))]
    async fn transition(
        &self,
        id: BookingId,
        action: BookingAction,
        decision: &Decision,
        cancel: &Cancellation,
    ) -> Result<Booking> {
        let mut booking = cancel
            .run(self.repo.find_booking_by_id(id))
            .await??
            .ok_or_else(|| BookingError::not_found(EntityKind::Booking, id))?;

        let expected = booking.status;
        if let Err(e) = lifecycle::apply(&mut booking, action, decision, self.clock.now()) {
            tracing::debug!(current = %expected, %action, "Transition rejected");
            return Err(e);
        }

        let committed = cancel
            .run(self.repo.update_booking(&booking, expected))
            .await??;
        if !committed {
            let current = cancel
                .run(self.repo.find_booking_by_id(id))
                .await??
                .map_or(expected, |b| b.status);
            tracing::debug!(%current, %action, "Booking changed underneath transition");
            return Err(BookingError::InvalidState {
                booking_id: id,
                current,
                action,
            });
        }

        self.invalidate().await;

        tracing::info!(from = %expected, to = %booking.status, "Booking transitioned");
        Ok(booking)
    }

    /// Bump the bookings and availability tokens. Runs after commit and
    /// ignores cancellation.
    async fn invalidate(&self) {
        let bookings = self.keys.token(CacheGroup::Bookings);
        let availability = self.keys.token(CacheGroup::Availability);
        tokio::join!(
            self.cache.bump_token(&bookings),
            self.cache.bump_token(&availability),
        );
    }

    // ═══════════════════════════════════════════════════════════
    // Reads
    // ═══════════════════════════════════════════════════════════

    /// Fetch one booking. Misses are cached too, so repeated lookups of an
    /// unknown ID stay off the database until the next booking write.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`] or a system error.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn get_booking(&self, id: BookingId, cancel: &Cancellation) -> Result<BookingDto> {
        let kind = CacheKind::BookingDetail;
        let version = self.cache.get_token(&self.keys.token_for(kind)).await;
        let key = self.keys.booking(version, id);
        let policy = kind.policy();
        let repo = &self.repo;

        let found: Option<BookingDto> = self
            .cache
            .get_or_set(&key, policy.ttl, policy.options().cache_absent(), || async move {
                let booking = cancel.run(repo.find_booking_by_id(id)).await??;
                Ok::<_, BookingError>(booking.as_ref().map(BookingDto::from))
            })
            .await?;

        found.ok_or_else(|| BookingError::not_found(EntityKind::Booking, id))
    }

    /// Bookings matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a system error if persistence fails.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn list_bookings(
        &self,
        filter: &BookingFilter,
        cancel: &Cancellation,
    ) -> Result<Vec<BookingDto>> {
        let kind = CacheKind::BookingList;
        let version = self.cache.get_token(&self.keys.token_for(kind)).await;
        let key = self.keys.booking_list(version, filter);
        let policy = kind.policy();
        let repo = &self.repo;

        self.cache
            .get_or_set(&key, policy.ttl, policy.options(), || async move {
                let bookings = cancel.run(repo.list_bookings(filter)).await??;
                Ok::<_, BookingError>(bookings.iter().map(BookingDto::from).collect())
            })
            .await
    }

    /// Free slots at `venue_id` on `date` for `party_size` guests.
    ///
    /// An unknown venue or an oversized party is an answer, not an error:
    /// the result is unavailable with the reason filled in.
    ///
    /// # Errors
    ///
    /// [`BookingError::InvalidArgument`] for an empty party, or a system
    /// error.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn check_availability(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
        party_size: u32,
        cancel: &Cancellation,
    ) -> Result<AvailabilityDto> {
        if party_size == 0 {
            return Err(BookingError::InvalidArgument(
                "Party size must be greater than 0".to_string(),
            ));
        }

        let kind = CacheKind::Availability;
        let version = self.cache.get_token(&self.keys.token_for(kind)).await;
        let key = self.keys.availability(version, venue_id, date, party_size);
        let policy = kind.policy();
        let repo = &self.repo;
        let engine = &self.engine;

        self.cache
            .get_or_set(&key, policy.ttl, policy.options(), || async move {
                let venue = cancel.run(repo.find_venue(venue_id)).await??;
                let occupying = match &venue {
                    Some(_) => {
                        let blocking = engine.policy().occupancy.blocking_statuses();
                        cancel
                            .run(repo.find_bookings_by_venue_and_date(venue_id, date, blocking))
                            .await??
                    }
                    None => Vec::new(),
                };
                let availability =
                    engine.evaluate(venue_id, venue.as_ref(), date, party_size, &occupying);
                Ok::<_, BookingError>(AvailabilityDto::from(&availability))
            })
            .await
    }
}
