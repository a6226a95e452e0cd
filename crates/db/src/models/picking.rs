//! Stock picking model.

use sqlx::FromRow;
use stockscan_core::types::{DbId, Timestamp};

/// A picking row from the `stock_pickings` table.
///
/// `kind`, `state`, and `sync_status` are stored as their string forms;
/// the core enums parse them where semantics matter.
#[derive(Debug, Clone, FromRow)]
pub struct Picking {
    pub id: DbId,
    pub name: String,
    pub kind: String,
    pub state: String,
    pub scheduled_date: Option<Timestamp>,
    pub origin: Option<String>,
    pub partner_name: Option<String>,
    pub source_location_id: DbId,
    pub dest_location_id: DbId,
    pub company_id: DbId,
    pub sync_status: String,
    pub last_sync_at: Option<Timestamp>,
    pub sync_error: Option<String>,
    pub location_hint: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A picking row joined with its location names, as the list endpoint
/// presents it.
#[derive(Debug, Clone, FromRow)]
pub struct PickingListItem {
    pub id: DbId,
    pub name: String,
    pub kind: String,
    pub state: String,
    pub scheduled_date: Option<Timestamp>,
    pub origin: Option<String>,
    pub partner_name: Option<String>,
    pub source_location: String,
    pub dest_location: String,
    pub sync_status: String,
}
