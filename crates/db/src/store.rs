//! Postgres implementations of the core storage traits.
//!
//! These adapters translate between the engine's narrow trait surface
//! and the repositories, including classification of unique-constraint
//! violations into [`StoreError::DuplicateLine`].

use sqlx::PgPool;
use stockscan_core::picking::{MoveProgress, PickingKind, PickingState, SyncStatus};
use stockscan_core::session::Session;
use stockscan_core::store::{
    InventoryStore, MoveHeader, NewMoveLine, PickingHeader, SessionStore, StoreError,
};
use stockscan_core::types::DbId;

use crate::models::move_line::CreateMoveLine;
use crate::repositories::lot_repo::LotRepo;
use crate::repositories::move_line_repo::MoveLineRepo;
use crate::repositories::move_repo::MoveRepo;
use crate::repositories::picking_repo::PickingRepo;
use crate::repositories::session_repo::SessionRepo;

/// Whether an error is a Postgres unique-constraint violation (23505).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// [`InventoryStore`] backed by the Postgres repositories.
#[derive(Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl InventoryStore for PgInventoryStore {
    async fn find_picking(&self, id: DbId) -> Result<Option<PickingHeader>, StoreError> {
        let Some(row) = PickingRepo::find_by_id(&self.pool, id).await.map_err(backend)? else {
            return Ok(None);
        };
        let kind =
            PickingKind::parse(&row.kind).map_err(|e| StoreError::Backend(e.to_string()))?;
        let state =
            PickingState::parse(&row.state).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Some(PickingHeader {
            id: row.id,
            name: row.name,
            kind,
            state,
            company_id: row.company_id,
        }))
    }

    async fn find_move(&self, id: DbId) -> Result<Option<MoveHeader>, StoreError> {
        let row = MoveRepo::find_by_id(&self.pool, id).await.map_err(backend)?;
        Ok(row.map(|m| MoveHeader {
            id: m.id,
            picking_id: m.picking_id,
            product_id: m.product_id,
            source_location_id: m.source_location_id,
            dest_location_id: m.dest_location_id,
        }))
    }

    async fn find_lot(&self, serial: &str, product_id: DbId) -> Result<Option<DbId>, StoreError> {
        let row = LotRepo::find_by_serial_and_product(&self.pool, serial, product_id)
            .await
            .map_err(backend)?;
        Ok(row.map(|l| l.id))
    }

    async fn create_lot(
        &self,
        serial: &str,
        product_id: DbId,
        company_id: DbId,
    ) -> Result<DbId, StoreError> {
        LotRepo::create(&self.pool, serial, product_id, company_id)
            .await
            .map_err(backend)
    }

    async fn move_line_exists(
        &self,
        move_id: DbId,
        lot_id: DbId,
        picking_id: DbId,
    ) -> Result<bool, StoreError> {
        MoveLineRepo::exists(&self.pool, move_id, lot_id, picking_id)
            .await
            .map_err(backend)
    }

    async fn insert_move_line(&self, line: &NewMoveLine) -> Result<(), StoreError> {
        let input = CreateMoveLine {
            move_id: line.move_id,
            picking_id: line.picking_id,
            product_id: line.product_id,
            lot_id: line.lot_id,
            qty: line.qty,
            source_location_id: line.source_location_id,
            dest_location_id: line.dest_location_id,
        };
        match MoveLineRepo::create(&self.pool, &input).await {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateLine),
            Err(err) => Err(backend(err)),
        }
    }

    async fn record_location_hint(&self, picking_id: DbId, hint: &str) -> Result<(), StoreError> {
        PickingRepo::set_location_hint(&self.pool, picking_id, hint)
            .await
            .map_err(backend)
    }

    async fn move_progress(&self, picking_id: DbId) -> Result<Vec<MoveProgress>, StoreError> {
        let rows = MoveRepo::progress_for_picking(&self.pool, picking_id)
            .await
            .map_err(backend)?;
        Ok(rows
            .into_iter()
            .map(|r| MoveProgress {
                move_id: r.move_id,
                expected_qty: r.expected_qty,
                done_qty: r.done_qty,
            })
            .collect())
    }

    async fn validate_picking(&self, picking_id: DbId) -> Result<(), StoreError> {
        let validated = PickingRepo::validate(&self.pool, picking_id)
            .await
            .map_err(backend)?;
        if validated {
            Ok(())
        } else {
            Err(StoreError::Backend(
                "picking is not in a validatable state".to_string(),
            ))
        }
    }

    async fn picking_state(&self, picking_id: DbId) -> Result<PickingState, StoreError> {
        let state = PickingRepo::state(&self.pool, picking_id)
            .await
            .map_err(backend)?
            .ok_or_else(|| StoreError::Backend(format!("picking {picking_id} disappeared")))?;
        PickingState::parse(&state).map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn set_sync_status(
        &self,
        picking_id: DbId,
        status: SyncStatus,
        error: Option<&str>,
    ) -> Result<(), StoreError> {
        PickingRepo::set_sync_status(&self.pool, picking_id, status.as_str(), error)
            .await
            .map_err(backend)
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// [`SessionStore`] backed by the `mobile_sessions` table.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SessionStore for PgSessionStore {
    async fn insert(&self, session: &Session) -> Result<(), StoreError> {
        SessionRepo::create(&self.pool, session)
            .await
            .map(|_| ())
            .map_err(backend)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, StoreError> {
        let row = SessionRepo::find_by_token_hash(&self.pool, token_hash)
            .await
            .map_err(backend)?;
        Ok(row.map(Session::from))
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, StoreError> {
        SessionRepo::delete_by_token_hash(&self.pool, token_hash)
            .await
            .map_err(backend)
    }
}
