//! # Hydra Booking
//!
//! Venue booking services over a relational store and a shared cache.
//!
//! - [`BookingService`]: create bookings, drive their lifecycle, read them
//!   back, answer availability queries
//! - [`VenueService`]: venue CRUD with cached reads
//! - [`CacheKeys`]: the key and version-token scheme both services share
//! - [`HydraApp`]: wiring, including [`HydraApp::connect`] for Postgres and
//!   Redis
//!
//! # Cache coherence
//!
//! ```text
//!  read ──▶ get_token(group) ──▶ key(v) ──▶ hit? ──yes──▶ return
//!                                             │
//!                                             no ──▶ load ──▶ set(key, ttl ± jitter)
//!
//!  write ──▶ persist ──▶ bump_token(group)     (old keys are never read again)
//! ```
//!
//! The cache is fail-open: with Redis down every read goes to Postgres and
//! every write still commits.
//!
//! # Concurrency
//!
//! Transitions of one booking are serialized by a compare-and-set on its
//! status, so of two concurrent confirms exactly one wins. Two creates for
//! the same interval are not serialized; both may pass the overlap check.

pub mod app;
pub mod config;
pub mod dto;
pub mod keys;
pub mod service;
pub mod venues;

pub use app::{BootstrapError, HydraApp};
pub use config::{AvailabilityConfig, CacheConfig, Config, ConfigError, PostgresConfig, RedisConfig};
pub use dto::{AvailabilityDto, BookingDto, TimeSlotDto, VenueDto};
pub use keys::{CacheGroup, CacheKeys, CacheKind, CachePolicy, DEFAULT_NAMESPACE};
pub use service::BookingService;
pub use venues::VenueService;
