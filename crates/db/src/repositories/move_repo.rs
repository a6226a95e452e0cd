//! Repository for the `stock_moves` table.

use sqlx::PgPool;
use stockscan_core::types::DbId;

use crate::models::stock_move::{MoveLineSummary, MoveProgressRow, StockMove};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, picking_id, product_id, expected_qty, source_location_id, dest_location_id";

/// Provides read operations for stock moves.
pub struct MoveRepo;

impl MoveRepo {
    /// Find a move by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StockMove>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stock_moves WHERE id = $1");
        sqlx::query_as::<_, StockMove>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Product lines for a picking, with `done_qty` recomputed from the
    /// current movement-line sums.
    pub async fn lines_for_picking(
        pool: &PgPool,
        picking_id: DbId,
    ) -> Result<Vec<MoveLineSummary>, sqlx::Error> {
        sqlx::query_as::<_, MoveLineSummary>(
            "SELECT m.id AS move_id, m.product_id, p.name AS product_name,
                    p.default_code, p.barcode, p.tracking, p.uom_name,
                    m.expected_qty, COALESCE(SUM(l.qty), 0) AS done_qty
             FROM stock_moves m
             JOIN products p ON p.id = m.product_id
             LEFT JOIN stock_move_lines l ON l.move_id = m.id
             WHERE m.picking_id = $1
             GROUP BY m.id, m.product_id, p.name, p.default_code, p.barcode,
                      p.tracking, p.uom_name, m.expected_qty
             ORDER BY m.id",
        )
        .bind(picking_id)
        .fetch_all(pool)
        .await
    }

    /// Per-move progress for the completion evaluator.
    pub async fn progress_for_picking(
        pool: &PgPool,
        picking_id: DbId,
    ) -> Result<Vec<MoveProgressRow>, sqlx::Error> {
        sqlx::query_as::<_, MoveProgressRow>(
            "SELECT m.id AS move_id, m.expected_qty, COALESCE(SUM(l.qty), 0) AS done_qty
             FROM stock_moves m
             LEFT JOIN stock_move_lines l ON l.move_id = m.id
             WHERE m.picking_id = $1
             GROUP BY m.id, m.expected_qty
             ORDER BY m.id",
        )
        .bind(picking_id)
        .fetch_all(pool)
        .await
    }
}
