//! Repository for the `stock_quants` table.

use sqlx::PgPool;
use stockscan_core::types::DbId;

use crate::models::quant::QuantSummary;

/// Provides read operations for on-hand quantities.
pub struct QuantRepo;

impl QuantRepo {
    /// Aggregate on-hand and reserved quantities for a lot across all
    /// locations.
    pub async fn summary_for_lot(
        pool: &PgPool,
        lot_id: DbId,
    ) -> Result<QuantSummary, sqlx::Error> {
        sqlx::query_as::<_, QuantSummary>(
            "SELECT COALESCE(SUM(quantity), 0) AS total_qty,
                    COALESCE(SUM(reserved_qty), 0) AS reserved_qty
             FROM stock_quants
             WHERE lot_id = $1",
        )
        .bind(lot_id)
        .fetch_one(pool)
        .await
    }

    /// The location currently holding the largest share of a lot, if any
    /// location holds a positive quantity.
    pub async fn top_location_for_lot(
        pool: &PgPool,
        lot_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT loc.complete_name
             FROM stock_quants q
             JOIN stock_locations loc ON loc.id = q.location_id
             WHERE q.lot_id = $1 AND q.quantity > 0
             ORDER BY q.quantity DESC
             LIMIT 1",
        )
        .bind(lot_id)
        .fetch_optional(pool)
        .await
    }
}
