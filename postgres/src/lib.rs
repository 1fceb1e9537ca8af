//! `PostgreSQL` persistence for Hydra.
//!
//! [`PgRepository`] implements the venue, customer and booking repository
//! traits from `hydra-core` on a shared `PgPool`. Booking updates are a
//! compare-and-set on status, so two concurrent transitions of one booking
//! cannot both commit.
//!
//! # Example
//!
//! ```no_run
//! use hydra_postgres::PgRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = PgRepository::connect("postgres://localhost/hydra", 10).await?;
//! repo.migrate().await?;
//! # Ok(())
//! # }
//! ```

mod bookings;
mod customers;
mod venues;

use hydra_core::StorageError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

pub use bookings::{status_from_db, status_to_db};

/// Repository over a `PostgreSQL` pool.
///
/// Cheap to clone; clones share the pool.
#[derive(Clone, Debug)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the first connection fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        Self::connect_with(database_url, max_connections, Duration::from_secs(5)).await
    }

    /// Open a pool with an explicit acquire timeout.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the first connection fails.
    pub async fn connect_with(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Database(format!("Failed to connect to Postgres: {e}")))?;

        tracing::info!(max_connections, "Connected to Postgres");

        Ok(Self { pool })
    }

    /// Apply the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Database(format!("Migration failed: {e}")))
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub(crate) fn db_error(e: sqlx::Error) -> StorageError {
    StorageError::Database(e.to_string())
}

pub(crate) fn to_i32(value: u32, column: &str) -> Result<i32, StorageError> {
    i32::try_from(value).map_err(|_| StorageError::Corrupt(format!("{column} out of range: {value}")))
}

pub(crate) fn to_u32(value: i32, column: &str) -> Result<u32, StorageError> {
    u32::try_from(value).map_err(|_| StorageError::Corrupt(format!("{column} is negative: {value}")))
}
