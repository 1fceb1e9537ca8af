//! Cache key scheme.
//!
//! Keys embed the version token of their group, so bumping a token orphans
//! every key built under the previous value:
//!
//! ```text
//! {ns}:venues:ver                          token
//! {ns}:venues:v{v}:{id}                    venue detail
//! {ns}:venues:list:v{v}                    venue list
//! {ns}:bookings:ver                        token
//! {ns}:bookings:v{v}:{id}                  booking detail
//! {ns}:bookings:list:v{v}:venue=..:customer=..:owner=..:status=..
//! {ns}:availability:ver                    token
//! {ns}:availability:v{v}:{venue}:{yyyy-mm-dd}:p{party}
//! ```

use chrono::NaiveDate;
use hydra_cache::CacheOptions;
use hydra_core::{BookingFilter, BookingId, VenueId};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;

/// Default key namespace ("hydra-booking").
pub const DEFAULT_NAMESPACE: &str = "hb";

/// Entity group sharing one version token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheGroup {
    /// Venue detail and list entries
    Venues,
    /// Booking detail and list entries
    Bookings,
    /// Availability results
    Availability,
}

impl CacheGroup {
    const fn segment(self) -> &'static str {
        match self {
            Self::Venues => "venues",
            Self::Bookings => "bookings",
            Self::Availability => "availability",
        }
    }
}

/// Query shape: picks the TTL policy and the token group its keys embed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Single venue
    VenueDetail,
    /// All venues
    VenueList,
    /// Single booking
    BookingDetail,
    /// Filtered bookings
    BookingList,
    /// Availability for venue/date/party
    Availability,
}

impl CacheKind {
    /// Token group whose version this query's keys embed.
    #[must_use]
    pub const fn group(self) -> CacheGroup {
        match self {
            Self::VenueDetail | Self::VenueList => CacheGroup::Venues,
            Self::BookingDetail | Self::BookingList => CacheGroup::Bookings,
            Self::Availability => CacheGroup::Availability,
        }
    }

    /// TTL and jitter for this query shape.
    #[must_use]
    pub const fn policy(self) -> CachePolicy {
        match self {
            Self::VenueDetail => CachePolicy::new(20 * 60, 30),
            Self::VenueList => CachePolicy::new(10 * 60, 30),
            Self::BookingDetail => CachePolicy::new(15 * 60, 20),
            Self::BookingList => CachePolicy::new(10 * 60, 20),
            Self::Availability => CachePolicy::new(5 * 60, 10),
        }
    }
}

/// Base TTL plus jitter bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachePolicy {
    /// Base time-to-live
    pub ttl: Duration,
    /// Maximum offset either side of `ttl`
    pub jitter: Duration,
}

impl CachePolicy {
    const fn new(ttl_secs: u64, jitter_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            jitter: Duration::from_secs(jitter_secs),
        }
    }

    /// `get_or_set` options for this policy.
    #[must_use]
    pub const fn options(self) -> CacheOptions {
        CacheOptions::jittered(self.jitter)
    }
}

/// Builds cache keys under one namespace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKeys {
    namespace: String,
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl CacheKeys {
    /// Key builder for `namespace`.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// The namespace prefix.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Version token key read by `kind`.
    #[must_use]
    pub fn token_for(&self, kind: CacheKind) -> String {
        self.token(kind.group())
    }

    /// Version token key of `group`.
    #[must_use]
    pub fn token(&self, group: CacheGroup) -> String {
        format!("{}:{}:ver", self.namespace, group.segment())
    }

    /// Single venue.
    #[must_use]
    pub fn venue(&self, version: i64, id: VenueId) -> String {
        format!("{}:venues:v{version}:{id}", self.namespace)
    }

    /// All venues.
    #[must_use]
    pub fn venue_list(&self, version: i64) -> String {
        format!("{}:venues:list:v{version}", self.namespace)
    }

    /// Single booking.
    #[must_use]
    pub fn booking(&self, version: i64, id: BookingId) -> String {
        format!("{}:bookings:v{version}:{id}", self.namespace)
    }

    /// Filtered booking list. Filters are always encoded in the same order,
    /// with `*` for an unset filter.
    #[must_use]
    pub fn booking_list(&self, version: i64, filter: &BookingFilter) -> String {
        format!(
            "{}:bookings:list:v{version}:venue={}:customer={}:owner={}:status={}",
            self.namespace,
            or_any(filter.venue_id),
            or_any(filter.customer_id),
            or_any(filter.owner_id),
            or_any(filter.status),
        )
    }

    /// Availability for a venue, UTC date and party size.
    #[must_use]
    pub fn availability(&self, version: i64, venue_id: VenueId, date: NaiveDate, party_size: u32) -> String {
        format!(
            "{}:availability:v{version}:{venue_id}:{}:p{party_size}",
            self.namespace,
            date.format("%Y-%m-%d"),
        )
    }
}

fn or_any<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "*".to_string(), |v| v.to_string())
}
