//! Repository for the `mobile_sessions` table.

use sqlx::PgPool;
use stockscan_core::session::Session;

use crate::models::session::MobileSession;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, token_hash, issued_at, expires_at";

/// Provides CRUD operations for mobile sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row. Existing sessions
    /// for the same user are left intact.
    pub async fn create(pool: &PgPool, session: &Session) -> Result<MobileSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO mobile_sessions (user_id, token_hash, issued_at, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MobileSession>(&query)
            .bind(session.user_id)
            .bind(&session.token_hash)
            .bind(session.issued_at)
            .bind(session.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find a session by its token digest, expired or not. Expiry is the
    /// caller's decision, not a query filter.
    pub async fn find_by_token_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<MobileSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM mobile_sessions WHERE token_hash = $1");
        sqlx::query_as::<_, MobileSession>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Delete a session by token digest. Returns `true` if a row existed.
    pub async fn delete_by_token_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM mobile_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete expired sessions. Returns the count of deleted rows.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM mobile_sessions WHERE expires_at < NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
