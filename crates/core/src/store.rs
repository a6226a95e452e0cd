//! Narrow storage traits the domain logic runs against.
//!
//! The inventory database is an external collaborator; the engine only
//! sees the handful of reads and writes declared here. The Postgres
//! implementations live in `stockscan-db`; tests use in-memory stores.
//!
//! Trait methods return `impl Future + Send` so implementors can use
//! plain `async fn` bodies while callers keep `Send` futures.

use std::future::Future;

use crate::picking::{MoveProgress, PickingKind, PickingState, SyncStatus};
use crate::session::Session;
use crate::types::DbId;

/// Error from a backing store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The unique constraint on `(move, lot, picking)` rejected an insert.
    ///
    /// This is the authoritative duplicate-scan guard: the pre-insert
    /// existence check is only a fast path, the constraint is the source
    /// of truth under concurrent requests.
    #[error("movement line already exists for this move, lot, and picking")]
    DuplicateLine,

    /// Any other backend failure.
    #[error("store error: {0}")]
    Backend(String),
}

/// Read-model of a picking as the reconciliation engine needs it.
#[derive(Debug, Clone)]
pub struct PickingHeader {
    pub id: DbId,
    pub name: String,
    pub kind: PickingKind,
    pub state: PickingState,
    pub company_id: DbId,
}

/// Read-model of a stock move.
#[derive(Debug, Clone)]
pub struct MoveHeader {
    pub id: DbId,
    pub picking_id: DbId,
    pub product_id: DbId,
    pub source_location_id: DbId,
    pub dest_location_id: DbId,
}

/// Input for creating one movement line.
#[derive(Debug, Clone)]
pub struct NewMoveLine {
    pub move_id: DbId,
    pub lot_id: DbId,
    pub picking_id: DbId,
    pub product_id: DbId,
    pub qty: f64,
    pub source_location_id: DbId,
    pub dest_location_id: DbId,
}

/// Inventory reads and writes used by the reconciliation engine.
pub trait InventoryStore: Send + Sync {
    /// Fetch a picking header by id.
    fn find_picking(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<PickingHeader>, StoreError>> + Send;

    /// Fetch a move header by id.
    fn find_move(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<MoveHeader>, StoreError>> + Send;

    /// Find a lot id by its `(serial, product)` identity.
    fn find_lot(
        &self,
        serial: &str,
        product_id: DbId,
    ) -> impl Future<Output = Result<Option<DbId>, StoreError>> + Send;

    /// Create a lot for the given serial, product, and company.
    fn create_lot(
        &self,
        serial: &str,
        product_id: DbId,
        company_id: DbId,
    ) -> impl Future<Output = Result<DbId, StoreError>> + Send;

    /// Whether a movement line already exists for `(move, lot, picking)`.
    fn move_line_exists(
        &self,
        move_id: DbId,
        lot_id: DbId,
        picking_id: DbId,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Insert one movement line. Must fail with
    /// [`StoreError::DuplicateLine`] when the uniqueness invariant on
    /// `(move, lot, picking)` would be violated.
    fn insert_move_line(
        &self,
        line: &NewMoveLine,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Record a scanner-supplied location hint on the picking.
    /// Auxiliary metadata only; never part of a line's identity.
    fn record_location_hint(
        &self,
        picking_id: DbId,
        hint: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Per-move progress for a picking, with `done_qty` recomputed from
    /// current movement-line sums.
    fn move_progress(
        &self,
        picking_id: DbId,
    ) -> impl Future<Output = Result<Vec<MoveProgress>, StoreError>> + Send;

    /// The inventory system's all-or-nothing validate operation: finalize
    /// every move of the picking or reject without side effects.
    fn validate_picking(
        &self,
        picking_id: DbId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Re-read the picking's current state.
    fn picking_state(
        &self,
        picking_id: DbId,
    ) -> impl Future<Output = Result<PickingState, StoreError>> + Send;

    /// Write the mobile sync status (and optional error message) plus the
    /// last-sync timestamp on the picking.
    fn set_sync_status(
        &self,
        picking_id: DbId,
        status: SyncStatus,
        error: Option<&str>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Persistence for mobile sessions, keyed by token digest.
pub trait SessionStore: Send + Sync {
    /// Persist a new session. Existing sessions are left intact.
    fn insert(&self, session: &Session) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Look up a session by its token digest.
    fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = Result<Option<Session>, StoreError>> + Send;

    /// Delete a session by token digest. Returns `true` if a row existed.
    fn delete_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}
