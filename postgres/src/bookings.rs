use crate::{PgRepository, db_error, to_i32, to_u32};
use chrono::{DateTime, NaiveDate, Utc};
use hydra_core::availability::utc_day_bounds;
use hydra_core::repository::StorageResult;
use hydra_core::{
    Booking, BookingFilter, BookingId, BookingRepository, BookingStatus, CustomerId, StorageError,
    VenueId,
};
use sqlx::Row;
use sqlx::postgres::PgRow;

const BOOKING_COLUMNS: &str = "b.id, b.venue_id, b.customer_id, b.start_utc, b.end_utc, \
     b.party_size, b.status, b.requested_at, b.decided_at, b.decided_by, \
     b.customer_note, b.admin_note, b.created_at, b.updated_at";

/// Convert status to its database representation.
#[must_use]
pub const fn status_to_db(status: BookingStatus) -> &'static str {
    status.as_str()
}

/// Parse status from its database representation.
///
/// # Errors
///
/// Returns [`StorageError::Corrupt`] if the string is not a known status.
pub fn status_from_db(s: &str) -> StorageResult<BookingStatus> {
    s.parse()
        .map_err(|e| StorageError::Corrupt(format!("{e}")))
}

fn statuses_to_db(statuses: &[BookingStatus]) -> Vec<String> {
    statuses.iter().map(|s| status_to_db(*s).to_string()).collect()
}

fn row_to_booking(row: &PgRow) -> StorageResult<Booking> {
    let corrupt = |e: sqlx::Error| StorageError::Corrupt(format!("booking row: {e}"));
    let status: String = row.try_get("status").map_err(corrupt)?;

    Ok(Booking {
        id: BookingId::from_uuid(row.try_get("id").map_err(corrupt)?),
        venue_id: VenueId::from_uuid(row.try_get("venue_id").map_err(corrupt)?),
        customer_id: CustomerId::from_uuid(row.try_get("customer_id").map_err(corrupt)?),
        start_utc: row.try_get("start_utc").map_err(corrupt)?,
        end_utc: row.try_get("end_utc").map_err(corrupt)?,
        party_size: to_u32(row.try_get("party_size").map_err(corrupt)?, "party_size")?,
        status: status_from_db(&status)?,
        requested_at: row.try_get("requested_at").map_err(corrupt)?,
        decided_at: row.try_get("decided_at").map_err(corrupt)?,
        decided_by: row.try_get("decided_by").map_err(corrupt)?,
        customer_note: row.try_get("customer_note").map_err(corrupt)?,
        admin_note: row.try_get("admin_note").map_err(corrupt)?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
        updated_at: row.try_get("updated_at").map_err(corrupt)?,
    })
}

impl BookingRepository for PgRepository {
    #[tracing::instrument(skip(self))]
    async fn find_booking_by_id(&self, id: BookingId) -> StorageResult<Option<Booking>> {
        let row = sqlx::query(&format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.as_ref().map(row_to_booking).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn list_bookings(&self, filter: &BookingFilter) -> StorageResult<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {BOOKING_COLUMNS}
            FROM bookings b
            LEFT JOIN venues v ON v.id = b.venue_id
            WHERE ($1::uuid IS NULL OR b.venue_id = $1)
              AND ($2::uuid IS NULL OR b.customer_id = $2)
              AND ($3::uuid IS NULL OR v.owner_id = $3)
              AND ($4::text IS NULL OR b.status = $4)
            ORDER BY b.created_at DESC
            "
        ))
        .bind(filter.venue_id.map(|id| *id.as_uuid()))
        .bind(filter.customer_id.map(|id| *id.as_uuid()))
        .bind(filter.owner_id.map(|id| *id.as_uuid()))
        .bind(filter.status.map(status_to_db))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_booking).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn find_bookings_overlapping(
        &self,
        venue_id: VenueId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        statuses: &[BookingStatus],
    ) -> StorageResult<Vec<Booking>> {
        // Half-open overlap: existing.start < end AND existing.end > start.
        let rows = sqlx::query(&format!(
            r"
            SELECT {BOOKING_COLUMNS}
            FROM bookings b
            WHERE b.venue_id = $1
              AND b.status = ANY($2)
              AND b.start_utc < $4
              AND b.end_utc > $3
            ORDER BY b.start_utc
            "
        ))
        .bind(venue_id.as_uuid())
        .bind(statuses_to_db(statuses))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_booking).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn find_bookings_by_venue_and_date(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> StorageResult<Vec<Booking>> {
        let Some((day_start, day_end)) = utc_day_bounds(date) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(&format!(
            r"
            SELECT {BOOKING_COLUMNS}
            FROM bookings b
            WHERE b.venue_id = $1
              AND b.status = ANY($2)
              AND b.start_utc >= $3
              AND b.start_utc < $4
            ORDER BY b.start_utc
            "
        ))
        .bind(venue_id.as_uuid())
        .bind(statuses_to_db(statuses))
        .bind(day_start)
        .bind(day_end)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_booking).collect()
    }

    #[tracing::instrument(skip(self, booking), fields(booking_id = %booking.id))]
    async fn insert_booking(&self, booking: &Booking) -> StorageResult<()> {
        sqlx::query(
            r"
            INSERT INTO bookings (
                id, venue_id, customer_id, start_utc, end_utc, party_size, status,
                requested_at, decided_at, decided_by, customer_note, admin_note,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.venue_id.as_uuid())
        .bind(booking.customer_id.as_uuid())
        .bind(booking.start_utc)
        .bind(booking.end_utc)
        .bind(to_i32(booking.party_size, "party_size")?)
        .bind(status_to_db(booking.status))
        .bind(booking.requested_at)
        .bind(booking.decided_at)
        .bind(&booking.decided_by)
        .bind(&booking.customer_note)
        .bind(&booking.admin_note)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    #[tracing::instrument(skip(self, booking), fields(booking_id = %booking.id, status = %booking.status))]
    async fn update_booking(&self, booking: &Booking, expected: BookingStatus) -> StorageResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE bookings
            SET status = $2, decided_at = $3, decided_by = $4, admin_note = $5, updated_at = $6
            WHERE id = $1 AND status = $7
            ",
        )
        .bind(booking.id.as_uuid())
        .bind(status_to_db(booking.status))
        .bind(booking.decided_at)
        .bind(&booking.decided_by)
        .bind(&booking.admin_note)
        .bind(booking.updated_at)
        .bind(status_to_db(expected))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let written = result.rows_affected() == 1;
        if !written {
            metrics::counter!("hydra_booking_stale_updates_total").increment(1);
            tracing::debug!(expected = %expected, "Booking status moved on before update");
        }
        Ok(written)
    }
}
