//! Ready-made domain values.
//!
//! Every timestamp helper lives on [`test_date`] (a Monday) so availability
//! scenarios read like a timetable.

use chrono::{DateTime, NaiveDate, Utc};
use hydra_core::{
    Booking, BookingId, BookingRules, BookingStatus, Customer, CustomerId, NewBooking, Venue,
    VenueId,
};

/// The date all fixtures are scheduled on.
///
/// # Panics
///
/// Never; the date is hardcoded.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 14).expect("hardcoded date should always be valid")
}

/// `hh:mm` UTC on [`test_date`].
///
/// # Panics
///
/// Panics if `hour` or `minute` is out of range.
#[must_use]
#[allow(clippy::expect_used)]
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    test_date()
        .and_hms_opt(hour, minute, 0)
        .expect("fixture time should be a valid time of day")
        .and_utc()
}

/// Venue with the given capacity, default rules and no owner.
#[must_use]
pub fn venue(capacity: u32) -> Venue {
    Venue {
        id: VenueId::new(),
        owner_id: None,
        name: "The Boathouse".to_string(),
        address: "12 Harbour Road".to_string(),
        capacity,
        rules: Some(BookingRules {
            slot_minutes: 90,
            auto_confirm: false,
        }),
    }
}

/// Venue with explicit rules.
#[must_use]
pub fn venue_with_rules(capacity: u32, slot_minutes: u32, auto_confirm: bool) -> Venue {
    Venue {
        rules: Some(BookingRules {
            slot_minutes,
            auto_confirm,
        }),
        ..venue(capacity)
    }
}

/// A customer.
#[must_use]
pub fn customer() -> Customer {
    Customer {
        id: CustomerId::new(),
        name: Some("Ada Lovelace".to_string()),
        email: Some("ada@example.com".to_string()),
        phone: None,
        locale: "en-GB".to_string(),
        marketing_opt_in: false,
        created_at: at(8, 0),
    }
}

/// A booking in `status` at `venue_id`.
#[must_use]
pub fn booking(
    venue_id: VenueId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    status: BookingStatus,
) -> Booking {
    Booking {
        id: BookingId::new(),
        venue_id,
        customer_id: CustomerId::new(),
        start_utc: start,
        end_utc: end,
        party_size: 2,
        status,
        requested_at: at(8, 0),
        decided_at: None,
        decided_by: None,
        customer_note: None,
        admin_note: None,
        created_at: at(8, 0),
        updated_at: at(8, 0),
    }
}

/// A booking request.
#[must_use]
pub fn new_booking(
    venue_id: VenueId,
    customer_id: CustomerId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    party_size: u32,
) -> NewBooking {
    NewBooking {
        venue_id,
        customer_id,
        start_utc: start,
        end_utc: end,
        party_size,
        customer_note: None,
    }
}
