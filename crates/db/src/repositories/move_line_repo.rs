//! Repository for the `stock_move_lines` table.

use sqlx::PgPool;
use stockscan_core::types::{DbId, Timestamp};

use crate::models::move_line::{CreateMoveLine, LotMovement, MoveLine, ScannedSerial};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, move_id, picking_id, product_id, lot_id, qty, \
                        source_location_id, dest_location_id, done_at";

/// Provides operations for movement lines.
pub struct MoveLineRepo;

impl MoveLineRepo {
    /// Insert one movement line, returning the created row.
    ///
    /// The uniqueness constraint on `(move, lot, picking)` surfaces as a
    /// database error with code 23505; the store layer classifies it.
    pub async fn create(
        pool: &PgPool,
        input: &CreateMoveLine,
    ) -> Result<MoveLine, sqlx::Error> {
        let query = format!(
            "INSERT INTO stock_move_lines
                (move_id, picking_id, product_id, lot_id, qty, source_location_id, dest_location_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MoveLine>(&query)
            .bind(input.move_id)
            .bind(input.picking_id)
            .bind(input.product_id)
            .bind(input.lot_id)
            .bind(input.qty)
            .bind(input.source_location_id)
            .bind(input.dest_location_id)
            .fetch_one(pool)
            .await
    }

    /// Whether a line already exists for `(move, lot, picking)`.
    pub async fn exists(
        pool: &PgPool,
        move_id: DbId,
        lot_id: DbId,
        picking_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM stock_move_lines
             WHERE move_id = $1 AND lot_id = $2 AND picking_id = $3",
        )
        .bind(move_id)
        .bind(lot_id)
        .bind(picking_id)
        .fetch_optional(pool)
        .await?;
        Ok(found.is_some())
    }

    /// All serials scanned against a picking, keyed by move.
    pub async fn serials_for_picking(
        pool: &PgPool,
        picking_id: DbId,
    ) -> Result<Vec<ScannedSerial>, sqlx::Error> {
        sqlx::query_as::<_, ScannedSerial>(
            "SELECT ml.move_id, l.serial
             FROM stock_move_lines ml
             JOIN lots l ON l.id = ml.lot_id
             WHERE ml.picking_id = $1
             ORDER BY ml.id",
        )
        .bind(picking_id)
        .fetch_all(pool)
        .await
    }

    /// When the lot last moved, if it ever has.
    pub async fn last_move_date(
        pool: &PgPool,
        lot_id: DbId,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        sqlx::query_scalar("SELECT MAX(done_at) FROM stock_move_lines WHERE lot_id = $1")
            .bind(lot_id)
            .fetch_one(pool)
            .await
    }

    /// Movement history for a lot, newest first.
    pub async fn history_for_lot(
        pool: &PgPool,
        lot_id: DbId,
        limit: i64,
    ) -> Result<Vec<LotMovement>, sqlx::Error> {
        sqlx::query_as::<_, LotMovement>(
            "SELECT pk.name AS picking_name, pk.kind, pk.state, ml.qty, ml.done_at,
                    src.complete_name AS source_location,
                    dst.complete_name AS dest_location
             FROM stock_move_lines ml
             JOIN stock_pickings pk ON pk.id = ml.picking_id
             JOIN stock_locations src ON src.id = ml.source_location_id
             JOIN stock_locations dst ON dst.id = ml.dest_location_id
             WHERE ml.lot_id = $1
             ORDER BY ml.done_at DESC, ml.id DESC
             LIMIT $2",
        )
        .bind(lot_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
