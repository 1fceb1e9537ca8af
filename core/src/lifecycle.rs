//! Booking lifecycle state machine.
//!
//! ```text
//! Pending ──confirm──▶ Confirmed ──cancel────▶ Cancelled
//!    │                     ├──mark_seated──▶ Seated
//!    └──decline──▶ Declined └──mark_no_show─▶ NoShow
//! ```
//!
//! Every guard violation is reported as [`BookingError::InvalidState`] and
//! leaves the booking untouched. Auto-confirm at creation is an initial
//! state choice made by the orchestrator, not a transition.

use crate::error::BookingError;
use crate::types::{Booking, BookingStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An action a venue admin (or customer) can take on a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingAction {
    /// Accept a pending request
    Confirm,
    /// Reject a pending request
    Decline,
    /// Cancel a confirmed booking
    Cancel,
    /// Record that the party arrived
    MarkSeated,
    /// Record that the party did not arrive
    MarkNoShow,
}

impl BookingAction {
    /// Every action, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Confirm,
        Self::Decline,
        Self::Cancel,
        Self::MarkSeated,
        Self::MarkNoShow,
    ];

    /// The only status this action may be applied from.
    #[must_use]
    pub const fn required_status(self) -> BookingStatus {
        match self {
            Self::Confirm | Self::Decline => BookingStatus::Pending,
            Self::Cancel | Self::MarkSeated | Self::MarkNoShow => BookingStatus::Confirmed,
        }
    }

    /// Status after a successful transition.
    #[must_use]
    pub const fn target_status(self) -> BookingStatus {
        match self {
            Self::Confirm => BookingStatus::Confirmed,
            Self::Decline => BookingStatus::Declined,
            Self::Cancel => BookingStatus::Cancelled,
            Self::MarkSeated => BookingStatus::Seated,
            Self::MarkNoShow => BookingStatus::NoShow,
        }
    }

    /// Verb used in user-facing messages.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Decline => "decline",
            Self::Cancel => "cancel",
            Self::MarkSeated => "mark seated",
            Self::MarkNoShow => "mark no-show",
        }
    }

    /// Returns `true` if this action is a venue decision on a pending request.
    #[must_use]
    pub const fn is_decision(self) -> bool {
        matches!(self, Self::Confirm | Self::Decline)
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

impl BookingStatus {
    /// Returns `true` if `action` is allowed from this status.
    #[must_use]
    pub fn permits(self, action: BookingAction) -> bool {
        self == action.required_status()
    }
}

/// Who is acting and why.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Admin identifier (display name or email)
    pub actor: String,
    /// Optional free-text note
    pub note: Option<String>,
}

impl Decision {
    /// Decision by `actor` without a note.
    #[must_use]
    pub fn by(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            note: None,
        }
    }

    /// Attach a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Apply `action` to `booking`.
///
/// # Errors
///
/// Returns [`BookingError::InvalidState`] if the booking's current status
/// does not permit the action. The booking is not modified in that case.
pub fn apply(
    booking: &mut Booking,
    action: BookingAction,
    decision: &Decision,
    now: DateTime<Utc>,
) -> Result<(), BookingError> {
    if !booking.status.permits(action) {
        return Err(BookingError::InvalidState {
            booking_id: booking.id,
            current: booking.status,
            action,
        });
    }

    booking.status = action.target_status();
    booking.updated_at = now;

    match action {
        BookingAction::Confirm | BookingAction::Decline => {
            booking.decided_at = Some(now);
            booking.decided_by = Some(decision.actor.clone());
            booking.admin_note.clone_from(&decision.note);
        }
        BookingAction::Cancel => {
            let actor = decision.actor.trim();
            let line = match (actor.is_empty(), decision.note.as_deref()) {
                (false, Some(reason)) => Some(format!("Cancelled by: {actor}. Reason: {reason}")),
                (false, None) => Some(format!("Cancelled by: {actor}")),
                (true, Some(reason)) => Some(format!("Cancelled. Reason: {reason}")),
                (true, None) => None,
            };
            if let Some(line) = line {
                append_note(&mut booking.admin_note, &line);
            }
        }
        BookingAction::MarkSeated | BookingAction::MarkNoShow => {
            if let Some(note) = decision.note.as_deref() {
                append_note(&mut booking.admin_note, note);
            }
        }
    }

    Ok(())
}

fn append_note(existing: &mut Option<String>, line: &str) {
    match existing {
        Some(notes) if !notes.is_empty() => {
            notes.push('\n');
            notes.push_str(line);
        }
        _ => *existing = Some(line.to_string()),
    }
}

impl Booking {
    /// Confirm a pending booking.
    ///
    /// # Errors
    ///
    /// [`BookingError::InvalidState`] unless the booking is `Pending`.
    pub fn confirm(&mut self, decision: &Decision, now: DateTime<Utc>) -> Result<(), BookingError> {
        apply(self, BookingAction::Confirm, decision, now)
    }

    /// Decline a pending booking.
    ///
    /// # Errors
    ///
    /// [`BookingError::InvalidState`] unless the booking is `Pending`.
    pub fn decline(&mut self, decision: &Decision, now: DateTime<Utc>) -> Result<(), BookingError> {
        apply(self, BookingAction::Decline, decision, now)
    }

    /// Cancel a confirmed booking.
    ///
    /// # Errors
    ///
    /// [`BookingError::InvalidState`] unless the booking is `Confirmed`.
    pub fn cancel(&mut self, decision: &Decision, now: DateTime<Utc>) -> Result<(), BookingError> {
        apply(self, BookingAction::Cancel, decision, now)
    }

    /// Mark a confirmed booking as seated.
    ///
    /// # Errors
    ///
    /// [`BookingError::InvalidState`] unless the booking is `Confirmed`.
    pub fn mark_seated(&mut self, decision: &Decision, now: DateTime<Utc>) -> Result<(), BookingError> {
        apply(self, BookingAction::MarkSeated, decision, now)
    }

    /// Mark a confirmed booking as a no-show.
    ///
    /// # Errors
    ///
    /// [`BookingError::InvalidState`] unless the booking is `Confirmed`.
    pub fn mark_no_show(&mut self, decision: &Decision, now: DateTime<Utc>) -> Result<(), BookingError> {
        apply(self, BookingAction::MarkNoShow, decision, now)
    }
}
