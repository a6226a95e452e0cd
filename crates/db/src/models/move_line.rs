//! Movement line model and DTOs.

use sqlx::FromRow;
use stockscan_core::types::{DbId, Timestamp};

/// A movement line row from the `stock_move_lines` table.
#[derive(Debug, Clone, FromRow)]
pub struct MoveLine {
    pub id: DbId,
    pub move_id: DbId,
    pub picking_id: DbId,
    pub product_id: DbId,
    pub lot_id: DbId,
    pub qty: f64,
    pub source_location_id: DbId,
    pub dest_location_id: DbId,
    pub done_at: Timestamp,
}

/// DTO for inserting one movement line.
pub struct CreateMoveLine {
    pub move_id: DbId,
    pub picking_id: DbId,
    pub product_id: DbId,
    pub lot_id: DbId,
    pub qty: f64,
    pub source_location_id: DbId,
    pub dest_location_id: DbId,
}

/// A serial scanned against a move, for the picking list response.
#[derive(Debug, Clone, FromRow)]
pub struct ScannedSerial {
    pub move_id: DbId,
    pub serial: String,
}

/// One movement of a lot, joined with its picking and locations, newest
/// first. Feeds the serial history endpoint.
#[derive(Debug, Clone, FromRow)]
pub struct LotMovement {
    pub picking_name: String,
    pub kind: String,
    pub state: String,
    pub qty: f64,
    pub done_at: Timestamp,
    pub source_location: String,
    pub dest_location: String,
}
