//! Boundary DTOs.
//!
//! These are what callers receive from read paths and what the cache
//! stores as JSON. Conversions are plain `From` impls; statuses travel as
//! their names.

use chrono::{DateTime, NaiveDate, Utc};
use hydra_core::{Availability, Booking, TimeSlot, Venue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A booking as rendered to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDto {
    /// Booking ID
    pub id: Uuid,
    /// Venue ID
    pub venue_id: Uuid,
    /// Customer ID
    pub customer_id: Uuid,
    /// Start (UTC)
    pub start_utc: DateTime<Utc>,
    /// End (UTC, exclusive)
    pub end_utc: DateTime<Utc>,
    /// Number of guests
    pub party_size: u32,
    /// Status name, e.g. `"Pending"`
    pub status: String,
    /// When the request was made
    pub requested_at: DateTime<Utc>,
    /// When the venue decided
    pub decided_at: Option<DateTime<Utc>>,
    /// Who decided
    pub decided_by: Option<String>,
    /// Customer note
    pub customer_note: Option<String>,
    /// Admin notes
    pub admin_note: Option<String>,
    /// Created
    pub created_at: DateTime<Utc>,
    /// Last updated
    pub updated_at: DateTime<Utc>,
}

impl From<&Booking> for BookingDto {
    fn from(b: &Booking) -> Self {
        Self {
            id: *b.id.as_uuid(),
            venue_id: *b.venue_id.as_uuid(),
            customer_id: *b.customer_id.as_uuid(),
            start_utc: b.start_utc,
            end_utc: b.end_utc,
            party_size: b.party_size,
            status: b.status.to_string(),
            requested_at: b.requested_at,
            decided_at: b.decided_at,
            decided_by: b.decided_by.clone(),
            customer_note: b.customer_note.clone(),
            admin_note: b.admin_note.clone(),
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

/// A venue as rendered to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueDto {
    /// Venue ID
    pub id: Uuid,
    /// Managing admin
    pub owner_id: Option<Uuid>,
    /// Name
    pub name: String,
    /// Address
    pub address: String,
    /// Maximum party size
    pub capacity: u32,
    /// Slot length, when the venue has rules
    pub slot_minutes: Option<u32>,
    /// Auto-confirm flag, when the venue has rules
    pub auto_confirm: Option<bool>,
}

impl From<&Venue> for VenueDto {
    fn from(v: &Venue) -> Self {
        Self {
            id: *v.id.as_uuid(),
            owner_id: v.owner_id.map(|o| *o.as_uuid()),
            name: v.name.clone(),
            address: v.address.clone(),
            capacity: v.capacity,
            slot_minutes: v.rules.map(|r| r.slot_minutes),
            auto_confirm: v.rules.map(|r| r.auto_confirm),
        }
    }
}

/// A free slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotDto {
    /// Start (UTC)
    pub start_utc: DateTime<Utc>,
    /// End (UTC, exclusive)
    pub end_utc: DateTime<Utc>,
}

impl From<&TimeSlot> for TimeSlotDto {
    fn from(s: &TimeSlot) -> Self {
        Self {
            start_utc: s.start_utc,
            end_utc: s.end_utc,
        }
    }
}

/// Availability answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDto {
    /// Venue queried
    pub venue_id: Uuid,
    /// Date queried
    pub date: NaiveDate,
    /// Party size queried
    pub party_size: u32,
    /// At least one slot is free
    pub is_available: bool,
    /// Explanation
    pub reason: String,
    /// Free slots in start order
    pub slots: Vec<TimeSlotDto>,
}

impl From<&Availability> for AvailabilityDto {
    fn from(a: &Availability) -> Self {
        Self {
            venue_id: *a.venue_id.as_uuid(),
            date: a.date,
            party_size: a.party_size,
            is_available: a.is_available,
            reason: a.reason.clone(),
            slots: a.slots.iter().map(TimeSlotDto::from).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hydra_core::BookingStatus;
    use hydra_testing::fixtures;

    #[test]
    fn booking_status_renders_as_name() {
        let venue = fixtures::venue(4);
        let booking = fixtures::booking(
            venue.id,
            fixtures::at(12, 0),
            fixtures::at(13, 0),
            BookingStatus::NoShow,
        );

        let dto = BookingDto::from(&booking);
        assert_eq!(dto.status, "NoShow");

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["status"], "NoShow");
        assert_eq!(json["partySize"], 2);
    }

    #[test]
    fn venue_without_rules_has_no_rule_fields() {
        let mut venue = fixtures::venue(4);
        venue.rules = None;
        let dto = VenueDto::from(&venue);
        assert_eq!(dto.slot_minutes, None);
        assert_eq!(dto.auto_confirm, None);
    }
}
