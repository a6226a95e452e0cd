//! Mobile session model and DTOs.

use sqlx::FromRow;
use stockscan_core::session::Session;
use stockscan_core::types::{DbId, Timestamp};

/// A session row from the `mobile_sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct MobileSession {
    pub id: DbId,
    pub user_id: DbId,
    pub token_hash: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl From<MobileSession> for Session {
    fn from(row: MobileSession) -> Self {
        Session {
            token_hash: row.token_hash,
            user_id: row.user_id,
            issued_at: row.issued_at,
            expires_at: row.expires_at,
        }
    }
}
