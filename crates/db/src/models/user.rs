//! User model.

use sqlx::FromRow;
use stockscan_core::types::{DbId, Timestamp};

/// A user row from the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub is_active: bool,
    /// Whether the user may perform stock operations from the scanner.
    pub has_stock_access: bool,
    pub company_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
