//! Repository for the `lots` table.

use sqlx::PgPool;
use stockscan_core::types::DbId;

use crate::models::lot::{Lot, LotWithProduct};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, serial, product_id, company_id, created_at";

/// Provides operations for lots (serial identities).
pub struct LotRepo;

impl LotRepo {
    /// Find a lot by its `(serial, product)` identity.
    pub async fn find_by_serial_and_product(
        pool: &PgPool,
        serial: &str,
        product_id: DbId,
    ) -> Result<Option<Lot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lots WHERE serial = $1 AND product_id = $2");
        sqlx::query_as::<_, Lot>(&query)
            .bind(serial)
            .bind(product_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a lot by serial, joined with its product. The serial check
    /// endpoints narrow by product when the client supplies one.
    pub async fn find_by_serial(
        pool: &PgPool,
        serial: &str,
        product_id: Option<DbId>,
    ) -> Result<Option<LotWithProduct>, sqlx::Error> {
        let product_clause = if product_id.is_some() {
            "AND l.product_id = $2"
        } else {
            ""
        };
        let query = format!(
            "SELECT l.id, l.serial, l.product_id, p.name AS product_name, p.default_code
             FROM lots l
             JOIN products p ON p.id = l.product_id
             WHERE l.serial = $1 {product_clause}
             ORDER BY l.id
             LIMIT 1"
        );
        let mut q = sqlx::query_as::<_, LotWithProduct>(&query).bind(serial);
        if let Some(product_id) = product_id {
            q = q.bind(product_id);
        }
        q.fetch_optional(pool).await
    }

    /// Create a lot, returning its ID. Idempotent under the uniqueness
    /// constraint on `(serial, product)`: a concurrent insert of the same
    /// identity yields the existing row's ID.
    pub async fn create(
        pool: &PgPool,
        serial: &str,
        product_id: DbId,
        company_id: DbId,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO lots (serial, product_id, company_id)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_lots_serial_product
             DO UPDATE SET serial = EXCLUDED.serial
             RETURNING id",
        )
        .bind(serial)
        .bind(product_id)
        .bind(company_id)
        .fetch_one(pool)
        .await
    }
}
