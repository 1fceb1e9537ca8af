use crate::{PgRepository, db_error, to_i32, to_u32};
use hydra_core::repository::StorageResult;
use hydra_core::{BookingRules, StorageError, UserId, Venue, VenueId, VenueRepository};
use sqlx::Row;
use sqlx::postgres::PgRow;

const VENUE_COLUMNS: &str = "id, owner_id, name, address, capacity, slot_minutes, auto_confirm";

fn row_to_venue(row: &PgRow) -> StorageResult<Venue> {
    let corrupt = |e: sqlx::Error| StorageError::Corrupt(format!("venue row: {e}"));

    let slot_minutes: Option<i32> = row.try_get("slot_minutes").map_err(corrupt)?;
    let auto_confirm: Option<bool> = row.try_get("auto_confirm").map_err(corrupt)?;
    let rules = match (slot_minutes, auto_confirm) {
        (None, None) => None,
        (slot_minutes, auto_confirm) => {
            let defaults = BookingRules::default();
            Some(BookingRules {
                slot_minutes: slot_minutes
                    .map(|m| to_u32(m, "slot_minutes"))
                    .transpose()?
                    .unwrap_or(defaults.slot_minutes),
                auto_confirm: auto_confirm.unwrap_or(defaults.auto_confirm),
            })
        }
    };

    Ok(Venue {
        id: VenueId::from_uuid(row.try_get("id").map_err(corrupt)?),
        owner_id: row
            .try_get::<Option<uuid::Uuid>, _>("owner_id")
            .map_err(corrupt)?
            .map(UserId::from_uuid),
        name: row.try_get("name").map_err(corrupt)?,
        address: row.try_get("address").map_err(corrupt)?,
        capacity: to_u32(row.try_get("capacity").map_err(corrupt)?, "capacity")?,
        rules,
    })
}

impl VenueRepository for PgRepository {
    #[tracing::instrument(skip(self))]
    async fn find_venue(&self, id: VenueId) -> StorageResult<Option<Venue>> {
        let row = sqlx::query(&format!("SELECT {VENUE_COLUMNS} FROM venues WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.as_ref().map(row_to_venue).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn list_venues(&self) -> StorageResult<Vec<Venue>> {
        let rows = sqlx::query(&format!("SELECT {VENUE_COLUMNS} FROM venues ORDER BY name"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter().map(row_to_venue).collect()
    }

    #[tracing::instrument(skip(self, venue), fields(venue_id = %venue.id))]
    async fn insert_venue(&self, venue: &Venue) -> StorageResult<()> {
        sqlx::query(
            r"
            INSERT INTO venues (id, owner_id, name, address, capacity, slot_minutes, auto_confirm)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(venue.id.as_uuid())
        .bind(venue.owner_id.map(|o| *o.as_uuid()))
        .bind(&venue.name)
        .bind(&venue.address)
        .bind(to_i32(venue.capacity, "capacity")?)
        .bind(venue.rules.map(|r| to_i32(r.slot_minutes, "slot_minutes")).transpose()?)
        .bind(venue.rules.map(|r| r.auto_confirm))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    #[tracing::instrument(skip(self, venue), fields(venue_id = %venue.id))]
    async fn update_venue(&self, venue: &Venue) -> StorageResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE venues
            SET owner_id = $2, name = $3, address = $4, capacity = $5,
                slot_minutes = $6, auto_confirm = $7
            WHERE id = $1
            ",
        )
        .bind(venue.id.as_uuid())
        .bind(venue.owner_id.map(|o| *o.as_uuid()))
        .bind(&venue.name)
        .bind(&venue.address)
        .bind(to_i32(venue.capacity, "capacity")?)
        .bind(venue.rules.map(|r| to_i32(r.slot_minutes, "slot_minutes")).transpose()?)
        .bind(venue.rules.map(|r| r.auto_confirm))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_venue(&self, id: VenueId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM venues WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() == 1)
    }
}
