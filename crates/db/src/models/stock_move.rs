//! Stock move model and per-move progress rows.

use sqlx::FromRow;
use stockscan_core::types::DbId;

/// A move row from the `stock_moves` table.
#[derive(Debug, Clone, FromRow)]
pub struct StockMove {
    pub id: DbId,
    pub picking_id: DbId,
    pub product_id: DbId,
    pub expected_qty: f64,
    pub source_location_id: DbId,
    pub dest_location_id: DbId,
}

/// One move joined with its product, with `done_qty` recomputed from the
/// current movement-line sums. Feeds the picking list lines.
#[derive(Debug, Clone, FromRow)]
pub struct MoveLineSummary {
    pub move_id: DbId,
    pub product_id: DbId,
    pub product_name: String,
    pub default_code: Option<String>,
    pub barcode: Option<String>,
    pub tracking: String,
    pub uom_name: String,
    pub expected_qty: f64,
    pub done_qty: f64,
}

/// Minimal progress row for the completion evaluator.
#[derive(Debug, Clone, FromRow)]
pub struct MoveProgressRow {
    pub move_id: DbId,
    pub expected_qty: f64,
    pub done_qty: f64,
}
