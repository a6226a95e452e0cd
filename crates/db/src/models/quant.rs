//! On-hand quantity (quant) models.

use sqlx::FromRow;

/// Aggregated on-hand picture for one lot across all locations.
#[derive(Debug, Clone, FromRow)]
pub struct QuantSummary {
    pub total_qty: f64,
    pub reserved_qty: f64,
}
