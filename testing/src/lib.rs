//! # Hydra Testing
//!
//! Test doubles and fixtures for the booking services.
//!
//! This crate provides:
//! - [`FixedClock`] and [`test_clock`] for deterministic timestamps
//! - [`InMemoryRepository`], implementing every persistence trait
//! - [`fixtures`] for venues, customers and bookings
//!
//! ## Example
//!
//! ```
//! use hydra_testing::{fixtures, InMemoryRepository};
//!
//! let repo = InMemoryRepository::new();
//! repo.seed_venue(fixtures::venue(10)).unwrap();
//! ```

use chrono::{DateTime, Utc};
use hydra_core::environment::Clock;

pub mod fixtures;
pub mod repository;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use hydra_testing::mocks::FixedClock;
    /// use hydra_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone, Copy)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Fixed clock at 07:00 UTC on [`crate::fixtures::test_date`], before
    /// business hours open.
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(crate::fixtures::at(7, 0))
    }
}

/// Install a test-writer `tracing` subscriber once per process.
///
/// Honours `RUST_LOG`; repeated calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use repository::InMemoryRepository;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().hour(), 7);
    }

    #[test]
    fn fixtures_share_a_date() {
        assert_eq!(fixtures::at(9, 30).date_naive(), fixtures::test_date());
    }
}
