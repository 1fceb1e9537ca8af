//! Error taxonomy for booking operations.

use crate::environment::Cancelled;
use crate::lifecycle::BookingAction;
use crate::types::{BookingId, BookingStatus, VenueId};
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Kind of entity a lookup failed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A venue
    Venue,
    /// A customer
    Customer,
    /// A booking
    Booking,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Venue => "Venue",
            Self::Customer => "Customer",
            Self::Booking => "Booking",
        })
    }
}

/// Failure reported by the persistence collaborator.
///
/// The message is backend text. It is kept for logs and never rendered to
/// callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Connection, query or constraint failure
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be mapped to a domain type
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Everything a booking operation can fail with.
///
/// Variants carry enough context for a caller to render a message; backend
/// detail only travels in the [`StorageError`] source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    // ═══════════════════════════════════════════════════════════
    // Caller errors
    // ═══════════════════════════════════════════════════════════

    /// Input rejected before any I/O.
    #[error("{0}")]
    InvalidArgument(String),

    /// Referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// What was looked up
        entity: EntityKind,
        /// The ID that was looked up
        id: Uuid,
    },

    /// Party does not fit the venue.
    #[error("Party size ({party_size}) exceeds venue capacity ({capacity})")]
    CapacityExceeded {
        /// Requested party size
        party_size: u32,
        /// Venue capacity
        capacity: u32,
    },

    /// Requested interval overlaps a booking that occupies the venue.
    #[error("The requested time slot conflicts with an existing booking")]
    SlotConflict {
        /// Venue requested
        venue_id: VenueId,
        /// Requested start
        start_utc: DateTime<Utc>,
        /// Requested end
        end_utc: DateTime<Utc>,
    },

    /// Lifecycle guard rejected the action.
    #[error("Cannot {action} booking in {current} status")]
    InvalidState {
        /// Booking the action targeted
        booking_id: BookingId,
        /// Status observed when the guard ran
        current: BookingStatus,
        /// Action that was attempted
        action: BookingAction,
    },

    // ═══════════════════════════════════════════════════════════
    // System errors
    // ═══════════════════════════════════════════════════════════

    /// Caller gave up before the operation finished.
    #[error("Operation cancelled")]
    Cancelled,

    /// Persistence collaborator failed.
    #[error("Storage unavailable")]
    Storage(#[source] StorageError),
}

impl BookingError {
    /// Shorthand for [`BookingError::NotFound`].
    #[must_use]
    pub fn not_found(entity: EntityKind, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Returns `true` if the caller can fix the request and retry.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Storage(_))
    }
}

impl From<StorageError> for BookingError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<Cancelled> for BookingError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

macro_rules! impl_into_uuid {
    ($($id:ty),*) => {
        $(
            impl From<$id> for Uuid {
                fn from(id: $id) -> Self {
                    *id.as_uuid()
                }
            }
        )*
    };
}

impl_into_uuid!(
    crate::types::BookingId,
    crate::types::VenueId,
    crate::types::CustomerId,
    crate::types::UserId
);
