//! In-memory persistence for tests.

use hydra_core::repository::StorageResult;
use hydra_core::{
    Booking, BookingFilter, BookingId, BookingRepository, BookingStatus, Customer, CustomerId,
    CustomerRepository, StorageError, Venue, VenueId, VenueRepository,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    venues: HashMap<VenueId, Venue>,
    customers: HashMap<CustomerId, Customer>,
    bookings: HashMap<BookingId, Booking>,
    /// Status to force onto a booking right before its next update.
    interleaved: HashMap<BookingId, BookingStatus>,
}

/// In-memory implementation of every repository trait.
///
/// Clones share state. Besides storage it counts reads and writes, can be
/// switched to fail every call, and can simulate a concurrent status change
/// landing between a service's read and its compare-and-set.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<State>>,
    unavailable: Arc<AtomicBool>,
    venue_reads: Arc<AtomicUsize>,
    booking_reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a venue without counting it as a write.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn seed_venue(&self, venue: Venue) -> StorageResult<()> {
        self.lock()?.venues.insert(venue.id, venue);
        Ok(())
    }

    /// Seed a customer.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn seed_customer(&self, customer: Customer) -> StorageResult<()> {
        self.lock()?.customers.insert(customer.id, customer);
        Ok(())
    }

    /// Seed a booking without counting it as a write.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn seed_booking(&self, booking: Booking) -> StorageResult<()> {
        self.lock()?.bookings.insert(booking.id, booking);
        Ok(())
    }

    /// Stored copy of a booking (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn booking(&self, id: BookingId) -> StorageResult<Option<Booking>> {
        Ok(self.lock()?.bookings.get(&id).cloned())
    }

    /// Number of stored bookings (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn booking_count(&self) -> StorageResult<usize> {
        Ok(self.lock()?.bookings.len())
    }

    /// Number of insert/update/delete calls that reached storage.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of venue lookups that reached storage.
    #[must_use]
    pub fn venue_read_count(&self) -> usize {
        self.venue_reads.load(Ordering::SeqCst)
    }

    /// Number of booking lookups that reached storage.
    #[must_use]
    pub fn booking_read_count(&self) -> usize {
        self.booking_reads.load(Ordering::SeqCst)
    }

    /// Make every call fail with [`StorageError::Database`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Before the next `update_booking` of `id`, overwrite its stored status
    /// with `status`, as if another request had committed first.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn interleave_status_change(&self, id: BookingId, status: BookingStatus) -> StorageResult<()> {
        self.lock()?.interleaved.insert(id, status);
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StorageError::Database("Mutex lock failed".to_string()))
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Database(
                "connection refused (in-memory outage)".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl VenueRepository for InMemoryRepository {
    fn find_venue(&self, id: VenueId) -> impl Future<Output = StorageResult<Option<Venue>>> + Send {
        let result = self.check_available().and_then(|()| {
            self.venue_reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.lock()?.venues.get(&id).cloned())
        });
        async move { result }
    }

    fn list_venues(&self) -> impl Future<Output = StorageResult<Vec<Venue>>> + Send {
        let result = self.check_available().and_then(|()| {
            self.venue_reads.fetch_add(1, Ordering::SeqCst);
            let mut venues: Vec<Venue> = self.lock()?.venues.values().cloned().collect();
            venues.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(venues)
        });
        async move { result }
    }

    fn insert_venue(&self, venue: &Venue) -> impl Future<Output = StorageResult<()>> + Send {
        let result = self.check_available().and_then(|()| {
            let mut state = self.lock()?;
            if state.venues.contains_key(&venue.id) {
                return Err(StorageError::Database("Venue ID already exists".to_string()));
            }
            state.venues.insert(venue.id, venue.clone());
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        async move { result }
    }

    fn update_venue(&self, venue: &Venue) -> impl Future<Output = StorageResult<bool>> + Send {
        let result = self.check_available().and_then(|()| {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut state = self.lock()?;
            Ok(match state.venues.get_mut(&venue.id) {
                Some(stored) => {
                    *stored = venue.clone();
                    true
                }
                None => false,
            })
        });
        async move { result }
    }

    fn delete_venue(&self, id: VenueId) -> impl Future<Output = StorageResult<bool>> + Send {
        let result = self.check_available().and_then(|()| {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(self.lock()?.venues.remove(&id).is_some())
        });
        async move { result }
    }
}

impl CustomerRepository for InMemoryRepository {
    fn find_customer(
        &self,
        id: CustomerId,
    ) -> impl Future<Output = StorageResult<Option<Customer>>> + Send {
        let result = self
            .check_available()
            .and_then(|()| Ok(self.lock()?.customers.get(&id).cloned()));
        async move { result }
    }
}

impl BookingRepository for InMemoryRepository {
    fn find_booking_by_id(
        &self,
        id: BookingId,
    ) -> impl Future<Output = StorageResult<Option<Booking>>> + Send {
        let result = self.check_available().and_then(|()| {
            self.booking_reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.lock()?.bookings.get(&id).cloned())
        });
        async move { result }
    }

    fn list_bookings(
        &self,
        filter: &BookingFilter,
    ) -> impl Future<Output = StorageResult<Vec<Booking>>> + Send {
        let result = self.check_available().and_then(|()| {
            self.booking_reads.fetch_add(1, Ordering::SeqCst);
            let state = self.lock()?;
            let mut bookings: Vec<Booking> = state
                .bookings
                .values()
                .filter(|b| filter.venue_id.is_none_or(|v| b.venue_id == v))
                .filter(|b| filter.customer_id.is_none_or(|c| b.customer_id == c))
                .filter(|b| filter.status.is_none_or(|s| b.status == s))
                .filter(|b| {
                    filter.owner_id.is_none_or(|owner| {
                        state
                            .venues
                            .get(&b.venue_id)
                            .is_some_and(|v| v.owner_id == Some(owner))
                    })
                })
                .cloned()
                .collect();
            bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(bookings)
        });
        async move { result }
    }

    fn find_bookings_overlapping(
        &self,
        venue_id: VenueId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        statuses: &[BookingStatus],
    ) -> impl Future<Output = StorageResult<Vec<Booking>>> + Send {
        let result = self.check_available().and_then(|()| {
            self.booking_reads.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .lock()?
                .bookings
                .values()
                .filter(|b| b.venue_id == venue_id && statuses.contains(&b.status))
                .filter(|b| b.overlaps(start, end))
                .cloned()
                .collect())
        });
        async move { result }
    }

    fn find_bookings_by_venue_and_date(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> impl Future<Output = StorageResult<Vec<Booking>>> + Send {
        let result = self.check_available().and_then(|()| {
            self.booking_reads.fetch_add(1, Ordering::SeqCst);
            let mut bookings: Vec<Booking> = self
                .lock()?
                .bookings
                .values()
                .filter(|b| b.venue_id == venue_id && statuses.contains(&b.status))
                .filter(|b| b.start_utc.date_naive() == date)
                .cloned()
                .collect();
            bookings.sort_by_key(|b| b.start_utc);
            Ok(bookings)
        });
        async move { result }
    }

    fn insert_booking(&self, booking: &Booking) -> impl Future<Output = StorageResult<()>> + Send {
        let result = self.check_available().and_then(|()| {
            let mut state = self.lock()?;
            if state.bookings.contains_key(&booking.id) {
                return Err(StorageError::Database("Booking ID already exists".to_string()));
            }
            state.bookings.insert(booking.id, booking.clone());
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        async move { result }
    }

    fn update_booking(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> impl Future<Output = StorageResult<bool>> + Send {
        let result = self.check_available().and_then(|()| {
            let mut state = self.lock()?;
            if let Some(forced) = state.interleaved.remove(&booking.id) {
                if let Some(stored) = state.bookings.get_mut(&booking.id) {
                    stored.status = forced;
                }
            }

            match state.bookings.get_mut(&booking.id) {
                Some(stored) if stored.status == expected => {
                    *stored = booking.clone();
                    self.writes.fetch_add(1, Ordering::SeqCst);
                    Ok(true)
                }
                _ => Ok(false),
            }
        });
        async move { result }
    }
}
