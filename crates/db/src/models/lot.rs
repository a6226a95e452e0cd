//! Lot (serial identity) model.

use sqlx::FromRow;
use stockscan_core::types::{DbId, Timestamp};

/// A lot row from the `lots` table.
#[derive(Debug, Clone, FromRow)]
pub struct Lot {
    pub id: DbId,
    pub serial: String,
    pub product_id: DbId,
    pub company_id: DbId,
    pub created_at: Timestamp,
}

/// A lot joined with its product, as the serial check endpoint needs it.
#[derive(Debug, Clone, FromRow)]
pub struct LotWithProduct {
    pub id: DbId,
    pub serial: String,
    pub product_id: DbId,
    pub product_name: String,
    pub default_code: Option<String>,
}
