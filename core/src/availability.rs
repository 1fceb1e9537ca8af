//! Slot availability and interval overlap.
//!
//! Everything here is pure: the engine is a function of venue
//! configuration and the bookings that occupy the requested date, so its
//! output can be cached by `(venue, date, party size, version)`.

use crate::types::{Availability, Booking, BookingStatus, TimeSlot, Venue, VenueId};
use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Half-open interval overlap: `[a_start, a_end)` and `[b_start, b_end)`
/// share at least one instant. Touching endpoints do not overlap.
#[must_use]
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// `[00:00, 24:00)` of `date` in UTC, or `None` for the last
/// representable date.
#[must_use]
pub fn utc_day_bounds(date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let next = date.checked_add_days(Days::new(1))?;
    Some((
        date.and_time(NaiveTime::MIN).and_utc(),
        next.and_time(NaiveTime::MIN).and_utc(),
    ))
}

/// Rejected business-hours window.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Business hours must open before they close (open {open}, close {close})")]
pub struct InvalidBusinessHours {
    /// Requested opening time
    pub open: NaiveTime,
    /// Requested closing time
    pub close: NaiveTime,
}

/// Daily window in which slots may be offered, in UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    open: NaiveTime,
    close: NaiveTime,
}

impl BusinessHours {
    /// Create a window.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBusinessHours`] unless `open < close`.
    pub fn new(open: NaiveTime, close: NaiveTime) -> Result<Self, InvalidBusinessHours> {
        if open >= close {
            return Err(InvalidBusinessHours { open, close });
        }
        Ok(Self { open, close })
    }

    /// Opening time.
    #[must_use]
    pub const fn open(&self) -> NaiveTime {
        self.open
    }

    /// Closing time.
    #[must_use]
    pub const fn close(&self) -> NaiveTime {
        self.close
    }
}

impl Default for BusinessHours {
    /// 09:00 to 22:00 UTC.
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Which booking statuses occupy a slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccupancyPolicy {
    /// Only confirmed bookings reserve capacity
    #[default]
    ConfirmedOnly,
    /// Pending requests hold their slot too
    ConfirmedAndPending,
}

impl OccupancyPolicy {
    /// Statuses that block a slot under this policy.
    #[must_use]
    pub const fn blocking_statuses(self) -> &'static [BookingStatus] {
        match self {
            Self::ConfirmedOnly => &[BookingStatus::Confirmed],
            Self::ConfirmedAndPending => &[BookingStatus::Confirmed, BookingStatus::Pending],
        }
    }

    /// Returns `true` if a booking in `status` occupies its interval.
    #[must_use]
    pub fn blocks(self, status: BookingStatus) -> bool {
        self.blocking_statuses().contains(&status)
    }
}

/// Tunables for slot generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityPolicy {
    /// Window slots must fit in
    pub hours: BusinessHours,
    /// Distance between consecutive candidate starts, in minutes
    pub step_minutes: u32,
    /// Slot length for venues without rules
    pub default_slot_minutes: u32,
    /// Which statuses occupy a slot
    pub occupancy: OccupancyPolicy,
}

impl Default for AvailabilityPolicy {
    fn default() -> Self {
        Self {
            hours: BusinessHours::default(),
            step_minutes: 30,
            default_slot_minutes: 90,
            occupancy: OccupancyPolicy::ConfirmedOnly,
        }
    }
}

/// Computes free slots for a venue on a date.
#[derive(Clone, Copy, Debug, Default)]
pub struct AvailabilityEngine {
    policy: AvailabilityPolicy,
}

impl AvailabilityEngine {
    /// Create an engine with the given policy.
    #[must_use]
    pub const fn new(policy: AvailabilityPolicy) -> Self {
        Self { policy }
    }

    /// The policy in effect.
    #[must_use]
    pub const fn policy(&self) -> &AvailabilityPolicy {
        &self.policy
    }

    /// Slot length to use for `venue`.
    #[must_use]
    pub fn slot_minutes_for(&self, venue: &Venue) -> u32 {
        match venue.slot_minutes_or(self.policy.default_slot_minutes) {
            0 => self.policy.default_slot_minutes,
            minutes => minutes,
        }
    }

    /// Every candidate slot of `slot_minutes` on `date`, in start order.
    ///
    /// Candidates start at opening time and advance by the policy step while
    /// the slot still ends by closing time. Consecutive candidates overlap
    /// when the step is shorter than the slot.
    #[must_use]
    pub fn candidate_slots(&self, date: NaiveDate, slot_minutes: u32) -> Vec<TimeSlot> {
        let open = date.and_time(self.policy.hours.open()).and_utc();
        let close = date.and_time(self.policy.hours.close()).and_utc();
        let length = Duration::minutes(i64::from(slot_minutes.max(1)));
        let step = Duration::minutes(i64::from(self.policy.step_minutes.max(1)));

        let mut slots = Vec::new();
        let mut start = open;
        while let Some(end) = start.checked_add_signed(length).filter(|end| *end <= close) {
            slots.push(TimeSlot {
                start_utc: start,
                end_utc: end,
            });
            let Some(next) = start.checked_add_signed(step) else {
                break;
            };
            start = next;
        }
        slots
    }

    /// Evaluate availability.
    ///
    /// `bookings` may contain anything the caller fetched; only bookings at
    /// `venue_id` that start on `date` and whose status blocks under the
    /// occupancy policy are considered.
    #[must_use]
    pub fn evaluate(
        &self,
        venue_id: VenueId,
        venue: Option<&Venue>,
        date: NaiveDate,
        party_size: u32,
        bookings: &[Booking],
    ) -> Availability {
        let Some(venue) = venue else {
            return Availability::unavailable(venue_id, date, party_size, "Venue not found");
        };

        if party_size > venue.capacity {
            return Availability::unavailable(
                venue_id,
                date,
                party_size,
                format!(
                    "Party size ({party_size}) exceeds venue capacity ({})",
                    venue.capacity
                ),
            );
        }

        let occupying: Vec<&Booking> = bookings
            .iter()
            .filter(|b| {
                b.venue_id == venue_id
                    && b.start_utc.date_naive() == date
                    && self.policy.occupancy.blocks(b.status)
            })
            .collect();

        let slots: Vec<TimeSlot> = self
            .candidate_slots(date, self.slot_minutes_for(venue))
            .into_iter()
            .filter(|slot| !occupying.iter().any(|b| b.overlaps(slot.start_utc, slot.end_utc)))
            .collect();

        let reason = if slots.is_empty() {
            "No available slots for this date".to_string()
        } else {
            format!("{} slot(s) available", slots.len())
        };

        Availability {
            venue_id,
            date,
            party_size,
            is_available: !slots.is_empty(),
            reason,
            slots,
        }
    }
}
