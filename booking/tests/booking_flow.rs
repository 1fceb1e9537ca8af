//! End-to-end booking flows against in-memory collaborators.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use hydra_booking::{BookingService, CacheKeys, VenueService};
use hydra_cache::{InMemoryStore, VersionedCache};
use hydra_core::{
    AvailabilityEngine, AvailabilityPolicy, BookingError, BookingFilter, BookingStatus,
    Cancellation, Customer, Decision, EntityKind, OccupancyPolicy, UserId, Venue,
};
use hydra_testing::{InMemoryRepository, fixtures, init_test_tracing, test_clock};
use std::sync::Arc;

struct Harness {
    repo: InMemoryRepository,
    store: InMemoryStore,
    bookings: BookingService<InMemoryRepository, InMemoryStore>,
    venue: Venue,
    customer: Customer,
}

impl Harness {
    fn new(capacity: u32) -> Self {
        Self::with_policy(capacity, AvailabilityPolicy::default())
    }

    fn with_policy(capacity: u32, policy: AvailabilityPolicy) -> Self {
        init_test_tracing();
        let repo = InMemoryRepository::new();
        let store = InMemoryStore::new();
        let venue = fixtures::venue(capacity);
        let customer = fixtures::customer();
        repo.seed_venue(venue.clone()).unwrap();
        repo.seed_customer(customer.clone()).unwrap();

        let bookings = BookingService::new(
            repo.clone(),
            VersionedCache::new(store.clone()),
            CacheKeys::default(),
            AvailabilityEngine::new(policy),
            Arc::new(test_clock()),
        );

        Self {
            repo,
            store,
            bookings,
            venue,
            customer,
        }
    }

    fn venues(&self) -> VenueService<InMemoryRepository, InMemoryStore> {
        VenueService::new(
            self.repo.clone(),
            VersionedCache::new(self.store.clone()),
            CacheKeys::default(),
        )
    }

    async fn request(&self, start: (u32, u32), end: (u32, u32), party: u32) -> Result<hydra_core::Booking, BookingError> {
        self.bookings
            .create_booking(
                fixtures::new_booking(
                    self.venue.id,
                    self.customer.id,
                    fixtures::at(start.0, start.1),
                    fixtures::at(end.0, end.1),
                    party,
                ),
                &Cancellation::none(),
            )
            .await
    }
}

fn host() -> Decision {
    Decision::by("host@boathouse.example")
}

// ═══════════════════════════════════════════════════════════
// Creation
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn new_booking_is_pending() {
    let h = Harness::new(10);

    let booking = h.request((18, 0), (19, 30), 4).await.unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(h.repo.booking(booking.id).unwrap(), Some(booking));
}

#[tokio::test]
async fn invalid_range_writes_nothing() {
    let h = Harness::new(10);

    for (start, end) in [((15, 0), (14, 0)), ((15, 0), (15, 0))] {
        let err = h.request(start, end, 2).await.unwrap_err();
        assert_eq!(
            err,
            BookingError::InvalidArgument("Start time must be before end time".to_string())
        );
    }

    let err = h.request((12, 0), (13, 0), 0).await.unwrap_err();
    assert_eq!(
        err,
        BookingError::InvalidArgument("Party size must be greater than 0".to_string())
    );

    assert_eq!(h.repo.write_count(), 0);
    assert_eq!(h.repo.venue_read_count(), 0);
    assert_eq!(h.store.raw("hb:bookings:ver").unwrap(), None);
}

#[tokio::test]
async fn party_larger_than_capacity_is_refused() {
    let h = Harness::new(8);

    let err = h.request((12, 0), (13, 0), 12).await.unwrap_err();

    assert_eq!(
        err,
        BookingError::CapacityExceeded {
            party_size: 12,
            capacity: 8
        }
    );
    assert_eq!(err.to_string(), "Party size (12) exceeds venue capacity (8)");
    assert_eq!(h.repo.write_count(), 0);
}

#[tokio::test]
async fn unknown_venue_and_customer() {
    let h = Harness::new(8);

    let err = h
        .bookings
        .create_booking(
            fixtures::new_booking(
                hydra_core::VenueId::new(),
                h.customer.id,
                fixtures::at(12, 0),
                fixtures::at(13, 0),
                2,
            ),
            &Cancellation::none(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound { entity: EntityKind::Venue, .. }));

    let err = h
        .bookings
        .create_booking(
            fixtures::new_booking(
                h.venue.id,
                hydra_core::CustomerId::new(),
                fixtures::at(12, 0),
                fixtures::at(13, 0),
                2,
            ),
            &Cancellation::none(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound { entity: EntityKind::Customer, .. }));
}

#[tokio::test]
async fn confirmed_booking_blocks_overlap_but_not_touch() {
    let h = Harness::new(10);
    let first = h.request((14, 0), (15, 0), 2).await.unwrap();
    h.bookings
        .confirm_booking(first.id, &host(), &Cancellation::none())
        .await
        .unwrap();

    let err = h.request((14, 30), (15, 30), 2).await.unwrap_err();
    assert!(matches!(err, BookingError::SlotConflict { .. }));
    assert_eq!(
        err.to_string(),
        "The requested time slot conflicts with an existing booking"
    );

    let touching = h.request((15, 0), (16, 0), 2).await.unwrap();
    assert_eq!(touching.status, BookingStatus::Pending);
}

#[tokio::test]
async fn pending_does_not_block_by_default() {
    let h = Harness::new(10);
    h.request((14, 0), (15, 0), 2).await.unwrap();

    assert!(h.request((14, 0), (15, 0), 2).await.is_ok());
}

#[tokio::test]
async fn pending_blocks_when_configured() {
    let h = Harness::with_policy(
        10,
        AvailabilityPolicy {
            occupancy: OccupancyPolicy::ConfirmedAndPending,
            ..AvailabilityPolicy::default()
        },
    );
    h.request((14, 0), (15, 0), 2).await.unwrap();

    let err = h.request((14, 30), (15, 30), 2).await.unwrap_err();
    assert!(matches!(err, BookingError::SlotConflict { .. }));

    let availability = h
        .bookings
        .check_availability(h.venue.id, fixtures::test_date(), 2, &Cancellation::none())
        .await
        .unwrap();
    assert!(availability
        .slots
        .iter()
        .all(|s| s.end_utc <= fixtures::at(14, 0) || s.start_utc >= fixtures::at(15, 0)));
}

// ═══════════════════════════════════════════════════════════
// Lifecycle
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn confirm_then_cancel_records_actor_and_reason() {
    let h = Harness::new(10);
    let booking = h.request((19, 0), (20, 30), 4).await.unwrap();

    let confirmed = h
        .bookings
        .confirm_booking(booking.id, &host().with_note("Terrace"), &Cancellation::none())
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.decided_by.as_deref(), Some("host@boathouse.example"));
    assert_eq!(confirmed.decided_at, Some(test_clock_now()));
    assert_eq!(confirmed.admin_note.as_deref(), Some("Terrace"));

    let cancelled = h
        .bookings
        .cancel_booking(
            booking.id,
            &Decision::by("manager").with_note("Kitchen closed"),
            &Cancellation::none(),
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(
        cancelled.admin_note.as_deref(),
        Some("Terrace\nCancelled by: manager. Reason: Kitchen closed")
    );
    assert_eq!(h.repo.booking(booking.id).unwrap(), Some(cancelled));
}

fn test_clock_now() -> hydra_core::DateTime<hydra_core::Utc> {
    use hydra_core::Clock;
    test_clock().now()
}

#[tokio::test]
async fn seated_and_no_show_need_confirmation() {
    let h = Harness::new(10);
    let booking = h.request((12, 0), (13, 0), 2).await.unwrap();
    let none = Cancellation::none();

    let err = h.bookings.mark_seated(booking.id, &host(), &none).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidState { current: BookingStatus::Pending, .. }));

    h.bookings.confirm_booking(booking.id, &host(), &none).await.unwrap();
    let seated = h.bookings.mark_seated(booking.id, &host(), &none).await.unwrap();
    assert_eq!(seated.status, BookingStatus::Seated);

    let err = h.bookings.mark_no_show(booking.id, &host(), &none).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidState { current: BookingStatus::Seated, .. }));
}

#[tokio::test]
async fn decline_is_terminal() {
    let h = Harness::new(10);
    let booking = h.request((12, 0), (13, 0), 2).await.unwrap();
    let none = Cancellation::none();

    let declined = h.bookings.decline_booking(booking.id, &host(), &none).await.unwrap();
    assert_eq!(declined.status, BookingStatus::Declined);

    let err = h.bookings.confirm_booking(booking.id, &host(), &none).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidState { current: BookingStatus::Declined, .. }));
}

#[tokio::test]
async fn double_confirm_is_refused() {
    let h = Harness::new(10);
    let booking = h.request((12, 0), (13, 0), 2).await.unwrap();
    let none = Cancellation::none();

    h.bookings.confirm_booking(booking.id, &host(), &none).await.unwrap();
    let writes = h.repo.write_count();

    let err = h.bookings.confirm_booking(booking.id, &host(), &none).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot confirm booking in Confirmed status");
    assert_eq!(h.repo.write_count(), writes);
}

#[tokio::test]
async fn losing_a_concurrent_transition_reports_the_winner() {
    let h = Harness::new(10);
    let booking = h.request((12, 0), (13, 0), 2).await.unwrap();
    h.repo
        .interleave_status_change(booking.id, BookingStatus::Declined)
        .unwrap();

    let err = h
        .bookings
        .confirm_booking(booking.id, &host(), &Cancellation::none())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BookingError::InvalidState {
            current: BookingStatus::Declined,
            action: hydra_core::BookingAction::Confirm,
            ..
        }
    ));
    let stored = h.repo.booking(booking.id).unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Declined);
    assert_eq!(stored.decided_by, None);
}

#[tokio::test]
async fn unknown_booking_is_not_found() {
    let h = Harness::new(10);
    let id = hydra_core::BookingId::new();

    let err = h
        .bookings
        .cancel_booking(id, &host(), &Cancellation::none())
        .await
        .unwrap_err();

    assert_eq!(err, BookingError::not_found(EntityKind::Booking, id));
}

// ═══════════════════════════════════════════════════════════
// Reads and cache coherence
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn get_booking_is_cached_until_a_booking_write() {
    let h = Harness::new(10);
    let booking = h.request((12, 0), (13, 0), 2).await.unwrap();
    let none = Cancellation::none();

    let first = h.bookings.get_booking(booking.id, &none).await.unwrap();
    let second = h.bookings.get_booking(booking.id, &none).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.status, "Pending");
    let reads = h.repo.booking_read_count();

    h.bookings.confirm_booking(booking.id, &host(), &none).await.unwrap();
    let after = h.bookings.get_booking(booking.id, &none).await.unwrap();
    assert_eq!(after.status, "Confirmed");
    assert!(h.repo.booking_read_count() > reads);
}

#[tokio::test]
async fn list_bookings_filters_and_orders() {
    let h = Harness::new(10);
    let owner = UserId::new();
    let mut owned = fixtures::venue(10);
    owned.owner_id = Some(owner);
    h.repo.seed_venue(owned.clone()).unwrap();

    let mut older = fixtures::booking(owned.id, fixtures::at(12, 0), fixtures::at(13, 0), BookingStatus::Pending);
    older.created_at = fixtures::at(8, 0);
    let mut newer = fixtures::booking(owned.id, fixtures::at(16, 0), fixtures::at(17, 0), BookingStatus::Pending);
    newer.created_at = fixtures::at(9, 0);
    h.repo.seed_booking(older.clone()).unwrap();
    h.repo.seed_booking(newer.clone()).unwrap();
    h.request((12, 0), (13, 0), 2).await.unwrap();

    let filter = BookingFilter {
        owner_id: Some(owner),
        ..BookingFilter::default()
    };
    let listed = h.bookings.list_bookings(&filter, &Cancellation::none()).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![*newer.id.as_uuid(), *older.id.as_uuid()]);

    let all = h
        .bookings
        .list_bookings(&BookingFilter::default(), &Cancellation::none())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn availability_reflects_confirmations() {
    let h = Harness::new(10);
    let date = fixtures::test_date();
    let none = Cancellation::none();

    let empty = h.bookings.check_availability(h.venue.id, date, 2, &none).await.unwrap();
    assert_eq!(empty.slots.len(), 24);
    assert_eq!(empty.reason, "24 slot(s) available");

    let booking = h.request((10, 0), (11, 30), 2).await.unwrap();
    let still_empty = h.bookings.check_availability(h.venue.id, date, 2, &none).await.unwrap();
    assert_eq!(still_empty.slots.len(), 24);

    h.bookings.confirm_booking(booking.id, &host(), &none).await.unwrap();
    let after = h.bookings.check_availability(h.venue.id, date, 2, &none).await.unwrap();
    assert!(after.is_available);
    assert!(after
        .slots
        .iter()
        .all(|s| s.end_utc <= fixtures::at(10, 0) || s.start_utc >= fixtures::at(11, 30)));
    assert_eq!(after.reason, format!("{} slot(s) available", after.slots.len()));
}

#[tokio::test]
async fn availability_for_unknown_venue_or_big_party() {
    let h = Harness::new(6);
    let date = fixtures::test_date();
    let none = Cancellation::none();

    let missing = h
        .bookings
        .check_availability(hydra_core::VenueId::new(), date, 2, &none)
        .await
        .unwrap();
    assert!(!missing.is_available);
    assert_eq!(missing.reason, "Venue not found");

    let too_big = h.bookings.check_availability(h.venue.id, date, 7, &none).await.unwrap();
    assert!(!too_big.is_available);
    assert!(too_big.slots.is_empty());
    assert_eq!(too_big.reason, "Party size (7) exceeds venue capacity (6)");
}

#[tokio::test]
async fn cached_venue_reads_are_byte_identical() {
    let h = Harness::new(10);
    let venues = h.venues();
    let none = Cancellation::none();

    let first = venues.get_venue(h.venue.id, &none).await.unwrap();
    let key = format!("hb:venues:v1:{}", h.venue.id);
    let stored = h.store.raw(&key).unwrap().unwrap();

    let second = venues.get_venue(h.venue.id, &none).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(serde_json::to_string(&second).unwrap(), stored);
    assert_eq!(h.store.raw(&key).unwrap().unwrap(), stored);
    assert_eq!(h.repo.venue_read_count(), 1);
}

#[tokio::test]
async fn venue_update_moves_readers_to_a_new_key() {
    let h = Harness::new(10);
    let venues = h.venues();
    let none = Cancellation::none();

    venues.get_venue(h.venue.id, &none).await.unwrap();
    let old_key = format!("hb:venues:v1:{}", h.venue.id);
    assert!(h.store.raw(&old_key).unwrap().is_some());

    let draft = hydra_core::VenueDraft {
        owner_id: None,
        name: "The Boathouse".to_string(),
        address: "12 Harbour Road".to_string(),
        capacity: 30,
        rules: h.venue.rules,
    };
    venues.update_venue(h.venue.id, draft, &none).await.unwrap();

    assert_eq!(h.store.raw("hb:venues:ver").unwrap().as_deref(), Some("2"));
    assert_eq!(h.store.raw("hb:availability:ver").unwrap().as_deref(), Some("2"));

    let fresh = venues.get_venue(h.venue.id, &none).await.unwrap();
    assert_eq!(fresh.capacity, 30);
    let new_key = format!("hb:venues:v2:{}", h.venue.id);
    assert_ne!(old_key, new_key);
    assert!(h.store.raw(&new_key).unwrap().is_some());
    assert_eq!(h.repo.venue_read_count(), 2);

    let listed = venues.list_venues(&none).await.unwrap();
    assert_eq!(listed.len(), 1);
    venues.delete_venue(h.venue.id, &none).await.unwrap();
    assert!(venues.list_venues(&none).await.unwrap().is_empty());
}

// ═══════════════════════════════════════════════════════════
// Failure modes
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn cache_outage_is_fail_open() {
    let h = Harness::new(10);
    h.store.set_offline(true);
    let none = Cancellation::none();

    let booking = h.request((12, 0), (13, 0), 2).await.unwrap();
    let confirmed = h.bookings.confirm_booking(booking.id, &host(), &none).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let fetched = h.bookings.get_booking(booking.id, &none).await.unwrap();
    assert_eq!(fetched.status, "Confirmed");
    let availability = h
        .bookings
        .check_availability(h.venue.id, fixtures::test_date(), 2, &none)
        .await
        .unwrap();
    assert!(availability.is_available);

    h.store.set_offline(false);
    assert!(h.store.is_empty().unwrap());
}

#[tokio::test]
async fn storage_outage_surfaces_generic_error() {
    let h = Harness::new(10);
    h.repo.set_unavailable(true);

    let err = h.request((12, 0), (13, 0), 2).await.unwrap_err();

    assert!(matches!(err, BookingError::Storage(_)));
    assert_eq!(err.to_string(), "Storage unavailable");
    assert!(!err.is_client_error());
    assert_eq!(h.store.raw("hb:bookings:ver").unwrap(), None);

    let err = h
        .bookings
        .check_availability(h.venue.id, fixtures::test_date(), 2, &Cancellation::none())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Storage(_)));
    assert!(h.store.is_empty().unwrap());
}

#[tokio::test]
async fn cancelled_request_does_not_write() {
    let h = Harness::new(10);
    let (handle, cancel) = Cancellation::new();
    handle.cancel();

    let err = h
        .bookings
        .create_booking(
            fixtures::new_booking(h.venue.id, h.customer.id, fixtures::at(12, 0), fixtures::at(13, 0), 2),
            &cancel,
        )
        .await
        .unwrap_err();

    assert_eq!(err, BookingError::Cancelled);
    assert_eq!(h.repo.write_count(), 0);
    assert_eq!(h.repo.booking_count().unwrap(), 0);
}
