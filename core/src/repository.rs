//! Persistence collaborator traits.
//!
//! Absence is `Ok(None)` (or `Ok(false)`), kept distinct from transient
//! [`StorageError`]s. Implementations live in `hydra-postgres` and, for
//! tests, `hydra-testing`.

use crate::error::StorageError;
use crate::types::{
    Booking, BookingFilter, BookingId, BookingStatus, Customer, CustomerId, Venue, VenueId,
};
use chrono::{DateTime, NaiveDate, Utc};

/// Result type alias for persistence calls.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Venue persistence.
pub trait VenueRepository: Send + Sync {
    /// Find a venue by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn find_venue(
        &self,
        id: VenueId,
    ) -> impl std::future::Future<Output = StorageResult<Option<Venue>>> + Send;

    /// All venues, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn list_venues(&self) -> impl std::future::Future<Output = StorageResult<Vec<Venue>>> + Send;

    /// Insert a new venue.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails or the ID already exists.
    fn insert_venue(
        &self,
        venue: &Venue,
    ) -> impl std::future::Future<Output = StorageResult<()>> + Send;

    /// Replace an existing venue.
    ///
    /// # Returns
    ///
    /// `false` if no venue with that ID exists.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn update_venue(
        &self,
        venue: &Venue,
    ) -> impl std::future::Future<Output = StorageResult<bool>> + Send;

    /// Delete a venue.
    ///
    /// # Returns
    ///
    /// `false` if no venue with that ID exists.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn delete_venue(
        &self,
        id: VenueId,
    ) -> impl std::future::Future<Output = StorageResult<bool>> + Send;
}

/// Customer lookups.
pub trait CustomerRepository: Send + Sync {
    /// Find a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn find_customer(
        &self,
        id: CustomerId,
    ) -> impl std::future::Future<Output = StorageResult<Option<Customer>>> + Send;
}

/// Booking persistence.
///
/// # Implementation Notes
///
/// - `update_booking` must be a compare-and-set on status so concurrent
///   transitions of the same booking serialize.
/// - Bookings are never deleted.
pub trait BookingRepository: Send + Sync {
    /// Find a booking by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn find_booking_by_id(
        &self,
        id: BookingId,
    ) -> impl std::future::Future<Output = StorageResult<Option<Booking>>> + Send;

    /// Bookings matching `filter`, newest first by `created_at`.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn list_bookings(
        &self,
        filter: &BookingFilter,
    ) -> impl std::future::Future<Output = StorageResult<Vec<Booking>>> + Send;

    /// Bookings at `venue_id` in one of `statuses` whose interval overlaps
    /// `[start, end)` (half-open).
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn find_bookings_overlapping(
        &self,
        venue_id: VenueId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        statuses: &[BookingStatus],
    ) -> impl std::future::Future<Output = StorageResult<Vec<Booking>>> + Send;

    /// Bookings at `venue_id` in one of `statuses` that start on `date` (UTC).
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn find_bookings_by_venue_and_date(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> impl std::future::Future<Output = StorageResult<Vec<Booking>>> + Send;

    /// Insert a new booking.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails or the ID already exists.
    fn insert_booking(
        &self,
        booking: &Booking,
    ) -> impl std::future::Future<Output = StorageResult<()>> + Send;

    /// Write `booking` only if the stored status is still `expected`.
    ///
    /// # Returns
    ///
    /// `true` if the row was written, `false` if it was missing or its
    /// status had already moved on.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn update_booking(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> impl std::future::Future<Output = StorageResult<bool>> + Send;
}
