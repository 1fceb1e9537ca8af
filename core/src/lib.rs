//! # Hydra Core
//!
//! Domain model for venue bookings: types, the booking lifecycle state
//! machine, availability computation and the persistence traits the
//! services are written against.
//!
//! Nothing in this crate performs I/O. The lifecycle and the availability
//! engine are pure functions of their inputs; repositories and the clock
//! are injected.
//!
//! ## Lifecycle
//!
//! ```text
//! Pending ─▶ Confirmed ─▶ Cancelled | Seated | NoShow
//!    └─────▶ Declined
//! ```
//!
//! ## Example
//!
//! ```
//! use hydra_core::availability::intervals_overlap;
//! use chrono::{TimeZone, Utc};
//!
//! let at = |h| Utc.with_ymd_and_hms(2025, 1, 1, h, 0, 0).unwrap();
//! assert!(intervals_overlap(at(14), at(16), at(15), at(17)));
//! assert!(!intervals_overlap(at(14), at(15), at(15), at(16)));
//! ```

pub mod availability;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod repository;
pub mod types;

pub use availability::{
    AvailabilityEngine, AvailabilityPolicy, BusinessHours, InvalidBusinessHours, OccupancyPolicy,
};
pub use environment::{Cancellation, CancellationHandle, Cancelled, Clock, SystemClock};
pub use error::{BookingError, EntityKind, Result, StorageError};
pub use lifecycle::{BookingAction, Decision};
pub use repository::{BookingRepository, CustomerRepository, StorageResult, VenueRepository};
pub use types::{
    Availability, Booking, BookingFilter, BookingId, BookingRules, BookingStatus, Customer,
    CustomerId, NewBooking, TimeSlot, UserId, Venue, VenueDraft, VenueId,
};

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
