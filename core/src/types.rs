//! Domain types for venue bookings.
//!
//! Identifiers are UUID newtypes so a `VenueId` can never be passed where a
//! `BookingId` is expected. Venues and customers are owned by other parts of
//! the platform; the booking core only reads them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a booking
    BookingId
);
define_id!(
    /// Unique identifier for a venue
    VenueId
);
define_id!(
    /// Unique identifier for a customer
    CustomerId
);
define_id!(
    /// Unique identifier for a platform user (venue owner / admin)
    UserId
);

// ============================================================================
// Booking status
// ============================================================================

/// Lifecycle status of a booking.
///
/// `Pending` is the normal initial state. `Declined`, `Cancelled`, `Seated`
/// and `NoShow` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    /// Requested by a customer, awaiting a venue decision
    Pending,
    /// Accepted by the venue
    Confirmed,
    /// Rejected by the venue
    Declined,
    /// Cancelled after confirmation
    Cancelled,
    /// Customer arrived
    Seated,
    /// Customer did not arrive
    NoShow,
}

impl BookingStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Declined,
        Self::Cancelled,
        Self::Seated,
        Self::NoShow,
    ];

    /// Canonical name, as stored and rendered.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Declined => "Declined",
            Self::Cancelled => "Cancelled",
            Self::Seated => "Seated",
            Self::NoShow => "NoShow",
        }
    }

    /// Returns `true` if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Declined | Self::Cancelled | Self::Seated | Self::NoShow
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    /// Case-insensitive; accepts `NoShow`, `no_show` and `no-show`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

// ============================================================================
// Venues and customers
// ============================================================================

/// Per-venue booking rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRules {
    /// Length of a bookable slot in minutes
    pub slot_minutes: u32,
    /// New bookings start `Confirmed` instead of `Pending`
    pub auto_confirm: bool,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            slot_minutes: 90,
            auto_confirm: true,
        }
    }
}

/// A bookable venue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    /// Venue ID
    pub id: VenueId,
    /// Admin user who manages the venue
    pub owner_id: Option<UserId>,
    /// Display name
    pub name: String,
    /// Street address
    pub address: String,
    /// Maximum party size
    pub capacity: u32,
    /// Booking rules; `None` means platform defaults without auto-confirm
    pub rules: Option<BookingRules>,
}

impl Venue {
    /// Slot length to use for this venue, falling back to `default_minutes`.
    #[must_use]
    pub fn slot_minutes_or(&self, default_minutes: u32) -> u32 {
        self.rules.map_or(default_minutes, |r| r.slot_minutes)
    }

    /// Whether new bookings at this venue skip the `Pending` stop.
    #[must_use]
    pub fn auto_confirms(&self) -> bool {
        self.rules.is_some_and(|r| r.auto_confirm)
    }
}

/// Input for creating or replacing a venue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueDraft {
    /// Admin user who manages the venue
    pub owner_id: Option<UserId>,
    /// Display name
    pub name: String,
    /// Street address
    pub address: String,
    /// Maximum party size
    pub capacity: u32,
    /// Booking rules
    pub rules: Option<BookingRules>,
}

impl VenueDraft {
    /// Materialize the draft as a venue with the given ID.
    #[must_use]
    pub fn into_venue(self, id: VenueId) -> Venue {
        Venue {
            id,
            owner_id: self.owner_id,
            name: self.name,
            address: self.address,
            capacity: self.capacity,
            rules: self.rules,
        }
    }
}

/// A customer who can request bookings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer ID
    pub id: CustomerId,
    /// Display name
    pub name: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Preferred locale
    pub locale: String,
    /// Marketing consent
    pub marketing_opt_in: bool,
    /// When the customer was created
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Bookings
// ============================================================================

/// A request to book a venue for a time interval.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking ID
    pub id: BookingId,
    /// Venue being booked
    pub venue_id: VenueId,
    /// Customer who requested the booking
    pub customer_id: CustomerId,
    /// Start of the half-open interval `[start_utc, end_utc)`
    pub start_utc: DateTime<Utc>,
    /// End of the interval (exclusive)
    pub end_utc: DateTime<Utc>,
    /// Number of guests
    pub party_size: u32,
    /// Lifecycle status
    pub status: BookingStatus,
    /// When the customer made the request
    pub requested_at: DateTime<Utc>,
    /// When the venue confirmed or declined
    pub decided_at: Option<DateTime<Utc>>,
    /// Admin who confirmed or declined
    pub decided_by: Option<String>,
    /// Note left by the customer
    pub customer_note: Option<String>,
    /// Notes left by venue admins
    pub admin_note: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Returns `true` if this booking's interval overlaps `[start, end)`.
    #[must_use]
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        crate::availability::intervals_overlap(self.start_utc, self.end_utc, start, end)
    }
}

/// Input for creating a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    /// Venue to book
    pub venue_id: VenueId,
    /// Customer making the request
    pub customer_id: CustomerId,
    /// Requested start (UTC)
    pub start_utc: DateTime<Utc>,
    /// Requested end (UTC, exclusive)
    pub end_utc: DateTime<Utc>,
    /// Number of guests
    pub party_size: u32,
    /// Optional note for the venue
    pub customer_note: Option<String>,
}

impl NewBooking {
    /// Build the booking record in its initial status.
    #[must_use]
    pub fn into_booking(self, initial: BookingStatus, now: DateTime<Utc>) -> Booking {
        Booking {
            id: BookingId::new(),
            venue_id: self.venue_id,
            customer_id: self.customer_id,
            start_utc: self.start_utc,
            end_utc: self.end_utc,
            party_size: self.party_size,
            status: initial,
            requested_at: now,
            decided_at: None,
            decided_by: None,
            customer_note: self.customer_note,
            admin_note: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Filters for listing bookings. `None` fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFilter {
    /// Only bookings at this venue
    pub venue_id: Option<VenueId>,
    /// Only bookings by this customer
    pub customer_id: Option<CustomerId>,
    /// Only bookings at venues managed by this user
    pub owner_id: Option<UserId>,
    /// Only bookings in this status
    pub status: Option<BookingStatus>,
}

// ============================================================================
// Availability
// ============================================================================

/// A candidate time slot `[start_utc, end_utc)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Slot start
    pub start_utc: DateTime<Utc>,
    /// Slot end (exclusive)
    pub end_utc: DateTime<Utc>,
}

/// Result of an availability query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// Venue queried
    pub venue_id: VenueId,
    /// Date queried (UTC)
    pub date: NaiveDate,
    /// Party size queried
    pub party_size: u32,
    /// `true` if at least one slot is free
    pub is_available: bool,
    /// Human-readable explanation
    pub reason: String,
    /// Free slots, in start order
    pub slots: Vec<TimeSlot>,
}

impl Availability {
    /// Unavailable result with no slots.
    #[must_use]
    pub fn unavailable(
        venue_id: VenueId,
        date: NaiveDate,
        party_size: u32,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            venue_id,
            date,
            party_size,
            is_available: false,
            reason: reason.into(),
            slots: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("confirmed".parse(), Ok(BookingStatus::Confirmed));
        assert_eq!("PENDING".parse(), Ok(BookingStatus::Pending));
        assert_eq!("no_show".parse(), Ok(BookingStatus::NoShow));
        assert_eq!("No-Show".parse(), Ok(BookingStatus::NoShow));
        assert!("archived".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn status_round_trips_through_display() {
        for status in BookingStatus::ALL {
            assert_eq!(status.to_string().parse(), Ok(status));
        }
    }

    #[test]
    fn only_pending_and_confirmed_are_open() {
        let open: Vec<_> = BookingStatus::ALL
            .into_iter()
            .filter(|s| !s.is_terminal())
            .collect();
        assert_eq!(open, vec![BookingStatus::Pending, BookingStatus::Confirmed]);
    }

    #[test]
    fn venue_without_rules_uses_defaults() {
        let venue = Venue {
            id: VenueId::new(),
            owner_id: None,
            name: "Harbour Room".to_string(),
            address: String::new(),
            capacity: 40,
            rules: None,
        };
        assert_eq!(venue.slot_minutes_or(90), 90);
        assert!(!venue.auto_confirms());
    }
}
