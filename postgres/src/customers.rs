use crate::{PgRepository, db_error};
use hydra_core::repository::StorageResult;
use hydra_core::{Customer, CustomerId, CustomerRepository, StorageError};
use sqlx::Row;

impl CustomerRepository for PgRepository {
    #[tracing::instrument(skip(self))]
    async fn find_customer(&self, id: CustomerId) -> StorageResult<Option<Customer>> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, phone, locale, marketing_opt_in, created_at
            FROM customers
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let corrupt = |e: sqlx::Error| StorageError::Corrupt(format!("customer row: {e}"));
        Ok(Some(Customer {
            id: CustomerId::from_uuid(row.try_get("id").map_err(corrupt)?),
            name: row.try_get("name").map_err(corrupt)?,
            email: row.try_get("email").map_err(corrupt)?,
            phone: row.try_get("phone").map_err(corrupt)?,
            locale: row.try_get("locale").map_err(corrupt)?,
            marketing_opt_in: row.try_get("marketing_opt_in").map_err(corrupt)?,
            created_at: row.try_get("created_at").map_err(corrupt)?,
        }))
    }
}
