//! Repository for the `stock_pickings` table.

use sqlx::PgPool;
use stockscan_core::types::DbId;

use crate::models::picking::{Picking, PickingListItem};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, kind, state, scheduled_date, origin, partner_name, \
                        source_location_id, dest_location_id, company_id, sync_status, \
                        last_sync_at, sync_error, location_hint, created_at, updated_at";

/// Filter for the picking list endpoint.
#[derive(Debug, Clone)]
pub struct PickingFilter {
    /// Picking states to include.
    pub states: Vec<String>,
    /// Optional kind restriction (`incoming` / `outgoing` / `internal`).
    pub kind: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Provides CRUD operations for stock pickings.
pub struct PickingRepo;

impl PickingRepo {
    /// Find a picking by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Picking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stock_pickings WHERE id = $1");
        sqlx::query_as::<_, Picking>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List pickings matching the filter, most urgent first (scheduled
    /// date descending, then newest ID).
    pub async fn list(
        pool: &PgPool,
        filter: &PickingFilter,
    ) -> Result<Vec<PickingListItem>, sqlx::Error> {
        let kind_clause = if filter.kind.is_some() {
            "AND p.kind = $2"
        } else {
            ""
        };
        let query = format!(
            "SELECT p.id, p.name, p.kind, p.state, p.scheduled_date, p.origin, p.partner_name,
                    src.complete_name AS source_location,
                    dst.complete_name AS dest_location,
                    p.sync_status
             FROM stock_pickings p
             JOIN stock_locations src ON src.id = p.source_location_id
             JOIN stock_locations dst ON dst.id = p.dest_location_id
             WHERE p.state = ANY($1) {kind_clause}
             ORDER BY p.scheduled_date DESC NULLS LAST, p.id DESC
             LIMIT ${limit_idx} OFFSET ${offset_idx}",
            limit_idx = if filter.kind.is_some() { 3 } else { 2 },
            offset_idx = if filter.kind.is_some() { 4 } else { 3 },
        );
        let mut q = sqlx::query_as::<_, PickingListItem>(&query).bind(&filter.states);
        if let Some(kind) = &filter.kind {
            q = q.bind(kind);
        }
        q.bind(filter.limit).bind(filter.offset).fetch_all(pool).await
    }

    /// Count pickings matching the filter, ignoring pagination.
    pub async fn count(pool: &PgPool, filter: &PickingFilter) -> Result<i64, sqlx::Error> {
        let kind_clause = if filter.kind.is_some() {
            "AND kind = $2"
        } else {
            ""
        };
        let query = format!(
            "SELECT COUNT(*) FROM stock_pickings WHERE state = ANY($1) {kind_clause}"
        );
        let mut q = sqlx::query_scalar::<_, i64>(&query).bind(&filter.states);
        if let Some(kind) = &filter.kind {
            q = q.bind(kind);
        }
        q.fetch_one(pool).await
    }

    /// Read just the picking's current state.
    pub async fn state(pool: &PgPool, id: DbId) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT state FROM stock_pickings WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All-or-nothing validate: mark the picking done only from an open
    /// state. Returns `true` if the transition happened.
    pub async fn validate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE stock_pickings SET state = 'done', updated_at = NOW()
             WHERE id = $1 AND state IN ('assigned', 'partially_available')",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the outcome of a mobile sync batch on the picking.
    pub async fn set_sync_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
        error: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE stock_pickings
             SET sync_status = $2, sync_error = $3, last_sync_at = NOW(), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a scanner-supplied location hint on the picking.
    pub async fn set_location_hint(
        pool: &PgPool,
        id: DbId,
        hint: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE stock_pickings SET location_hint = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(hint)
        .execute(pool)
        .await?;
        Ok(())
    }
}
