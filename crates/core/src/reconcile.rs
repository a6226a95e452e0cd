//! Serial-number reconciliation engine.
//!
//! Takes a batch of scanned serial numbers for one picking and, per
//! entry: resolves the lot/serial identity (creating it only for
//! inbound movements), writes exactly one movement line per
//! `(move, lot, picking)` triple, and isolates failures so no entry can
//! abort its siblings. After the batch, the completion evaluator decides
//! whether the picking has become fully satisfied and can be validated.
//!
//! Resubmitting a batch is safe: already-written lines are rejected as
//! duplicate scans.

use crate::picking::{all_moves_satisfied, MoveDirection, PickingState, SyncStatus};
use crate::store::{InventoryStore, MoveHeader, NewMoveLine, PickingHeader, StoreError};
use crate::types::DbId;

/// Serial tracking implies unit quantity per movement line.
const SERIAL_LINE_QTY: f64 = 1.0;

/// Placeholder serial label for entries that did not supply one.
const UNKNOWN_SERIAL: &str = "Unknown";

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// One scanned entry as submitted by the handheld device.
///
/// Fields are optional because a missing field is a per-entry error
/// (`MissingFields`), not a malformed request.
#[derive(Debug, Clone, Default)]
pub struct ScanEntry {
    pub product_id: Option<DbId>,
    pub move_id: Option<DbId>,
    pub serial: Option<String>,
    /// Scanner-reported shelf/bin reference, recorded best-effort.
    pub location: Option<String>,
}

/// Classification of a per-entry failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryErrorKind {
    /// `product_id`, `move_id`, or `serial_number` missing/empty.
    MissingFields,
    /// The move does not exist or belongs to a different picking.
    InvalidMove,
    /// Unknown serial on an outbound or internal movement.
    SerialNotFound,
    /// A line already exists for this `(move, lot, picking)`.
    DuplicateScan,
    /// Unexpected failure while applying the entry.
    Processing,
}

impl EntryErrorKind {
    /// Stable wire code. Duplicate scans and unexpected failures collapse
    /// into `PROCESSING_ERROR`.
    pub fn code(&self) -> &'static str {
        match self {
            EntryErrorKind::MissingFields => "MISSING_FIELDS",
            EntryErrorKind::InvalidMove => "INVALID_MOVE",
            EntryErrorKind::SerialNotFound => "SERIAL_NOT_FOUND",
            EntryErrorKind::DuplicateScan | EntryErrorKind::Processing => "PROCESSING_ERROR",
        }
    }
}

/// A captured per-entry failure, reported alongside its serial number.
#[derive(Debug, Clone)]
pub struct EntryError {
    pub serial: String,
    pub kind: EntryErrorKind,
    pub message: String,
}

/// Result of reconciling one batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Number of entries that produced a movement line.
    pub processed: usize,
    /// Per-entry failures, in submission order.
    pub errors: Vec<EntryError>,
    /// The picking's state after the completion evaluator ran.
    pub state: PickingState,
    pub picking_name: String,
}

/// Failure of the resolver (§ serial identity).
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The identity does not exist and the movement direction forbids
    /// creating it.
    #[error("Serial number not found in system")]
    SerialNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure of the movement-line writer.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Serial number already scanned for this move")]
    DuplicateScan,

    #[error("Invalid move for this picking")]
    InvalidMove,

    #[error(transparent)]
    Store(StoreError),
}

/// Top-level failure that aborts the whole batch before any entry runs.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Picking {0} not found")]
    PickingNotFound(DbId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Orchestrates the resolver, the writer, and the completion evaluator
/// over one batch of scanned entries.
pub struct Reconciler<'a, S> {
    store: &'a S,
}

impl<'a, S: InventoryStore> Reconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Reconcile a batch of scanned entries against a picking.
    ///
    /// Entries are applied sequentially and independently; a failing
    /// entry is recorded and never aborts its siblings. The only
    /// top-level failures are an unknown picking or a store failure on
    /// the initial picking fetch.
    pub async fn reconcile(
        &self,
        picking_id: DbId,
        entries: &[ScanEntry],
    ) -> Result<BatchOutcome, ReconcileError> {
        let picking = self
            .store
            .find_picking(picking_id)
            .await?
            .ok_or(ReconcileError::PickingNotFound(picking_id))?;

        let mut processed = 0usize;
        let mut errors = Vec::new();

        for entry in entries {
            match self.apply_entry(&picking, entry).await {
                Ok(()) => processed += 1,
                Err(err) => {
                    tracing::warn!(
                        picking = %picking.name,
                        serial = %err.serial,
                        code = err.kind.code(),
                        error = %err.message,
                        "Scan entry rejected"
                    );
                    errors.push(err);
                }
            }
        }

        let state = self.evaluate_completion(&picking).await;

        tracing::info!(
            picking = %picking.name,
            processed,
            rejected = errors.len(),
            state = state.as_str(),
            "Batch reconciliation complete"
        );

        Ok(BatchOutcome {
            processed,
            errors,
            state,
            picking_name: picking.name,
        })
    }

    /// Apply one entry: validate fields, check the move, resolve the lot,
    /// write the line.
    async fn apply_entry(
        &self,
        picking: &PickingHeader,
        entry: &ScanEntry,
    ) -> Result<(), EntryError> {
        let serial_label = entry
            .serial
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_SERIAL.to_string());

        // 1. All three identifying fields must be present.
        let (product_id, move_id, serial) = match (entry.product_id, entry.move_id, &entry.serial)
        {
            (Some(p), Some(m), Some(s)) if !s.is_empty() => (p, m, s.as_str()),
            _ => {
                return Err(EntryError {
                    serial: serial_label,
                    kind: EntryErrorKind::MissingFields,
                    message: "Missing required fields".to_string(),
                })
            }
        };

        let entry_err = |kind: EntryErrorKind, message: String| EntryError {
            serial: serial_label.clone(),
            kind,
            message,
        };

        // 2. The move must exist and belong to the target picking.
        let mv = self
            .store
            .find_move(move_id)
            .await
            .map_err(|e| entry_err(EntryErrorKind::Processing, e.to_string()))?
            .filter(|m| m.picking_id == picking.id)
            .ok_or_else(|| {
                entry_err(
                    EntryErrorKind::InvalidMove,
                    "Invalid move for this picking".to_string(),
                )
            })?;

        // 3. Resolve the lot; creation is gated on the picking's direction.
        let direction = picking.kind.direction();
        let lot_id = self
            .resolve(serial, product_id, picking.company_id, direction)
            .await
            .map_err(|e| match e {
                ResolveError::SerialNotFound => {
                    entry_err(EntryErrorKind::SerialNotFound, e.to_string())
                }
                ResolveError::Store(inner) => {
                    entry_err(EntryErrorKind::Processing, inner.to_string())
                }
            })?;

        // 4. Write exactly one movement line.
        self.write(&mv, lot_id, picking, entry.location.as_deref())
            .await
            .map_err(|e| match e {
                WriteError::DuplicateScan => entry_err(EntryErrorKind::DuplicateScan, e.to_string()),
                WriteError::InvalidMove => {
                    entry_err(EntryErrorKind::InvalidMove, e.to_string())
                }
                WriteError::Store(inner) => {
                    entry_err(EntryErrorKind::Processing, inner.to_string())
                }
            })
    }

    /// Resolve the canonical lot for `(serial, product)`.
    ///
    /// An existing identity is returned unconditionally; a missing one is
    /// created only for inbound movements. For outbound and internal
    /// movements a missing identity is an inventory error, never
    /// fabricated.
    pub async fn resolve(
        &self,
        serial: &str,
        product_id: DbId,
        company_id: DbId,
        direction: MoveDirection,
    ) -> Result<DbId, ResolveError> {
        if let Some(lot_id) = self.store.find_lot(serial, product_id).await? {
            return Ok(lot_id);
        }

        match direction {
            MoveDirection::Inbound => {
                let lot_id = self.store.create_lot(serial, product_id, company_id).await?;
                tracing::debug!(serial, product_id, lot_id, "Created lot for inbound serial");
                Ok(lot_id)
            }
            MoveDirection::Outbound | MoveDirection::Internal => {
                Err(ResolveError::SerialNotFound)
            }
        }
    }

    /// Write one movement line for the resolved lot against a move.
    ///
    /// The store's uniqueness constraint on `(move, lot, picking)` is the
    /// source of truth for the duplicate guard; the existence check just
    /// avoids a doomed insert in the common case.
    pub async fn write(
        &self,
        mv: &MoveHeader,
        lot_id: DbId,
        picking: &PickingHeader,
        location_hint: Option<&str>,
    ) -> Result<(), WriteError> {
        if mv.picking_id != picking.id {
            return Err(WriteError::InvalidMove);
        }

        let exists = self
            .store
            .move_line_exists(mv.id, lot_id, picking.id)
            .await
            .map_err(WriteError::Store)?;
        if exists {
            return Err(WriteError::DuplicateScan);
        }

        if let Some(hint) = location_hint.filter(|h| !h.is_empty()) {
            // Best-effort metadata; a failed hint write never fails the scan.
            if let Err(err) = self.store.record_location_hint(picking.id, hint).await {
                tracing::warn!(picking_id = picking.id, error = %err, "Could not record location hint");
            }
        }

        let line = NewMoveLine {
            move_id: mv.id,
            lot_id,
            picking_id: picking.id,
            product_id: mv.product_id,
            qty: SERIAL_LINE_QTY,
            source_location_id: mv.source_location_id,
            dest_location_id: mv.dest_location_id,
        };

        match self.store.insert_move_line(&line).await {
            Ok(()) => Ok(()),
            Err(StoreError::DuplicateLine) => Err(WriteError::DuplicateScan),
            Err(other) => Err(WriteError::Store(other)),
        }
    }

    /// Decide whether the picking can be auto-completed, then record the
    /// sync outcome.
    ///
    /// Only open pickings are considered. A rejected validate operation is
    /// logged and leaves the picking as it was; only a failure of the
    /// evaluator itself (reading progress) is recorded as a sync error.
    /// Neither ever fails the enclosing batch.
    pub async fn evaluate_completion(&self, picking: &PickingHeader) -> PickingState {
        let mut sync_error: Option<String> = None;

        if picking.state.is_open() {
            match self.store.move_progress(picking.id).await {
                Ok(progress) => {
                    if all_moves_satisfied(&progress) {
                        if let Err(err) = self.store.validate_picking(picking.id).await {
                            tracing::warn!(
                                picking = %picking.name,
                                error = %err,
                                "Could not validate picking"
                            );
                        } else {
                            tracing::info!(picking = %picking.name, "Picking auto-validated");
                        }
                    }
                }
                Err(err) => {
                    tracing::error!(picking = %picking.name, error = %err, "Completion evaluation failed");
                    sync_error = Some(err.to_string());
                }
            }
        }

        let status = if sync_error.is_none() {
            SyncStatus::Synced
        } else {
            SyncStatus::Error
        };
        if let Err(err) = self
            .store
            .set_sync_status(picking.id, status, sync_error.as_deref())
            .await
        {
            tracing::error!(picking_id = picking.id, error = %err, "Could not record sync status");
        }

        // Report whatever state the picking ended in.
        match self.store.picking_state(picking.id).await {
            Ok(state) => state,
            Err(err) => {
                tracing::error!(picking_id = picking.id, error = %err, "Could not re-read picking state");
                picking.state
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;

    use super::*;
    use crate::picking::{MoveProgress, PickingKind};

    /// In-memory inventory store. Uniqueness of `(move, lot, picking)` is
    /// enforced at insert time, mirroring the database constraint.
    #[derive(Default)]
    struct MemoryInventory {
        inner: Mutex<Inner>,
        /// When set, `validate_picking` rejects like the real operation
        /// does on insufficient quantities.
        reject_validation: bool,
        /// When set, `move_progress` fails, simulating an evaluator fault.
        fail_progress: bool,
    }

    #[derive(Default)]
    struct Inner {
        pickings: Vec<PickingHeader>,
        moves: Vec<(MoveHeader, f64)>, // header + expected qty
        lots: Vec<(DbId, String, DbId)>, // id, serial, product
        lines: Vec<NewMoveLine>,
        next_lot_id: DbId,
        sync: Vec<(DbId, SyncStatus, Option<String>)>,
        hints: Vec<(DbId, String)>,
    }

    impl MemoryInventory {
        fn with_picking(kind: PickingKind, moves: &[(DbId, DbId, f64)]) -> Self {
            let store = Self::default();
            {
                let mut inner = store.inner.lock().unwrap();
                inner.next_lot_id = 1;
                inner.pickings.push(PickingHeader {
                    id: 1,
                    name: "WH/TEST/0001".to_string(),
                    kind,
                    state: PickingState::Assigned,
                    company_id: 1,
                });
                for &(move_id, product_id, expected) in moves {
                    inner.moves.push((
                        MoveHeader {
                            id: move_id,
                            picking_id: 1,
                            product_id,
                            source_location_id: 10,
                            dest_location_id: 20,
                        },
                        expected,
                    ));
                }
            }
            store
        }

        fn add_lot(&self, serial: &str, product_id: DbId) -> DbId {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.next_lot_id;
            inner.next_lot_id += 1;
            inner.lots.push((id, serial.to_string(), product_id));
            id
        }

        fn line_count(&self) -> usize {
            self.inner.lock().unwrap().lines.len()
        }

        fn lot_count(&self) -> usize {
            self.inner.lock().unwrap().lots.len()
        }

        fn last_sync(&self) -> Option<(SyncStatus, Option<String>)> {
            let inner = self.inner.lock().unwrap();
            inner.sync.last().map(|(_, s, e)| (*s, e.clone()))
        }
    }

    impl InventoryStore for MemoryInventory {
        async fn find_picking(&self, id: DbId) -> Result<Option<PickingHeader>, StoreError> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .pickings
                .iter()
                .find(|p| p.id == id)
                .cloned())
        }

        async fn find_move(&self, id: DbId) -> Result<Option<MoveHeader>, StoreError> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .moves
                .iter()
                .find(|(m, _)| m.id == id)
                .map(|(m, _)| m.clone()))
        }

        async fn find_lot(&self, serial: &str, product_id: DbId) -> Result<Option<DbId>, StoreError> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .lots
                .iter()
                .find(|(_, s, p)| s == serial && *p == product_id)
                .map(|(id, _, _)| *id))
        }

        async fn create_lot(
            &self,
            serial: &str,
            product_id: DbId,
            _company_id: DbId,
        ) -> Result<DbId, StoreError> {
            Ok(self.add_lot(serial, product_id))
        }

        async fn move_line_exists(
            &self,
            move_id: DbId,
            lot_id: DbId,
            picking_id: DbId,
        ) -> Result<bool, StoreError> {
            Ok(self.inner.lock().unwrap().lines.iter().any(|l| {
                l.move_id == move_id && l.lot_id == lot_id && l.picking_id == picking_id
            }))
        }

        async fn insert_move_line(&self, line: &NewMoveLine) -> Result<(), StoreError> {
            let mut inner = self.inner.lock().unwrap();
            // The constraint, not the caller's existence check, decides.
            if inner.lines.iter().any(|l| {
                l.move_id == line.move_id
                    && l.lot_id == line.lot_id
                    && l.picking_id == line.picking_id
            }) {
                return Err(StoreError::DuplicateLine);
            }
            inner.lines.push(line.clone());
            Ok(())
        }

        async fn record_location_hint(&self, picking_id: DbId, hint: &str) -> Result<(), StoreError> {
            self.inner
                .lock()
                .unwrap()
                .hints
                .push((picking_id, hint.to_string()));
            Ok(())
        }

        async fn move_progress(&self, picking_id: DbId) -> Result<Vec<MoveProgress>, StoreError> {
            if self.fail_progress {
                return Err(StoreError::Backend("progress query failed".to_string()));
            }
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .moves
                .iter()
                .filter(|(m, _)| m.picking_id == picking_id)
                .map(|(m, expected)| MoveProgress {
                    move_id: m.id,
                    expected_qty: *expected,
                    done_qty: inner
                        .lines
                        .iter()
                        .filter(|l| l.move_id == m.id)
                        .map(|l| l.qty)
                        .sum(),
                })
                .collect())
        }

        async fn validate_picking(&self, picking_id: DbId) -> Result<(), StoreError> {
            if self.reject_validation {
                return Err(StoreError::Backend(
                    "insufficient quantities to validate".to_string(),
                ));
            }
            let mut inner = self.inner.lock().unwrap();
            if let Some(p) = inner.pickings.iter_mut().find(|p| p.id == picking_id) {
                p.state = PickingState::Done;
            }
            Ok(())
        }

        async fn picking_state(&self, picking_id: DbId) -> Result<PickingState, StoreError> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .pickings
                .iter()
                .find(|p| p.id == picking_id)
                .map(|p| p.state)
                .unwrap_or(PickingState::Draft))
        }

        async fn set_sync_status(
            &self,
            picking_id: DbId,
            status: SyncStatus,
            error: Option<&str>,
        ) -> Result<(), StoreError> {
            self.inner
                .lock()
                .unwrap()
                .sync
                .push((picking_id, status, error.map(String::from)));
            Ok(())
        }
    }

    fn entry(product_id: DbId, move_id: DbId, serial: &str) -> ScanEntry {
        ScanEntry {
            product_id: Some(product_id),
            move_id: Some(move_id),
            serial: Some(serial.to_string()),
            location: None,
        }
    }

    // -- scenario: incoming picking fully satisfied ---------------------------

    #[tokio::test]
    async fn incoming_batch_completes_picking() {
        // P1: one move expecting qty 2 of product X.
        let store = MemoryInventory::with_picking(PickingKind::Incoming, &[(100, 42, 2.0)]);
        let engine = Reconciler::new(&store);

        let outcome = engine
            .reconcile(1, &[entry(42, 100, "SN1"), entry(42, 100, "SN2")])
            .await
            .unwrap();

        assert_eq!(outcome.processed, 2);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.state, PickingState::Done);
        assert_eq!(outcome.picking_name, "WH/TEST/0001");
        assert_eq!(store.line_count(), 2);
        assert_eq!(store.lot_count(), 2);
        assert_eq!(store.last_sync(), Some((SyncStatus::Synced, None)));
    }

    #[tokio::test]
    async fn resubmitted_batch_reports_duplicates_only() {
        let store = MemoryInventory::with_picking(PickingKind::Incoming, &[(100, 42, 2.0)]);
        let engine = Reconciler::new(&store);

        engine
            .reconcile(1, &[entry(42, 100, "SN1"), entry(42, 100, "SN2")])
            .await
            .unwrap();

        // Retry one of the already-processed serials.
        let outcome = engine.reconcile(1, &[entry(42, 100, "SN1")]).await.unwrap();

        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].serial, "SN1");
        assert_eq!(outcome.errors[0].kind, EntryErrorKind::DuplicateScan);
        assert_eq!(outcome.errors[0].kind.code(), "PROCESSING_ERROR");
        // No second line for the same (move, lot, picking).
        assert_eq!(store.line_count(), 2);
    }

    #[tokio::test]
    async fn duplicate_within_one_batch_rejected() {
        let store = MemoryInventory::with_picking(PickingKind::Incoming, &[(100, 42, 2.0)]);
        let engine = Reconciler::new(&store);

        let outcome = engine
            .reconcile(1, &[entry(42, 100, "SN1"), entry(42, 100, "SN1")])
            .await
            .unwrap();

        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].kind, EntryErrorKind::DuplicateScan);
        assert_eq!(store.line_count(), 1);
    }

    #[tokio::test]
    async fn constraint_catches_race_missed_by_existence_check() {
        let store = MemoryInventory::with_picking(PickingKind::Incoming, &[(100, 42, 2.0)]);

        // Another request inserted the same line between our existence
        // check and our insert; simulate by bypassing the engine.
        let lot_id = store.add_lot("SN1", 42);
        let mv = MoveHeader {
            id: 100,
            picking_id: 1,
            product_id: 42,
            source_location_id: 10,
            dest_location_id: 20,
        };
        let picking = PickingHeader {
            id: 1,
            name: "WH/TEST/0001".to_string(),
            kind: PickingKind::Incoming,
            state: PickingState::Assigned,
            company_id: 1,
        };

        let engine = Reconciler::new(&store);
        engine.write(&mv, lot_id, &picking, None).await.unwrap();

        // Writing again maps the constraint violation to a duplicate scan.
        assert_matches!(
            engine.write(&mv, lot_id, &picking, None).await,
            Err(WriteError::DuplicateScan)
        );
        assert_eq!(store.line_count(), 1);
    }

    // -- direction gating -----------------------------------------------------

    #[tokio::test]
    async fn outbound_unknown_serial_fails() {
        let store = MemoryInventory::with_picking(PickingKind::Outgoing, &[(100, 42, 1.0)]);
        let engine = Reconciler::new(&store);

        let outcome = engine.reconcile(1, &[entry(42, 100, "GHOST")]).await.unwrap();

        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.errors[0].kind, EntryErrorKind::SerialNotFound);
        assert_eq!(outcome.errors[0].kind.code(), "SERIAL_NOT_FOUND");
        // Never fabricate identities for stock leaving the warehouse.
        assert_eq!(store.lot_count(), 0);
    }

    #[tokio::test]
    async fn outbound_existing_serial_resolves() {
        let store = MemoryInventory::with_picking(PickingKind::Outgoing, &[(100, 42, 1.0)]);
        store.add_lot("SN9", 42);
        let engine = Reconciler::new(&store);

        let outcome = engine.reconcile(1, &[entry(42, 100, "SN9")]).await.unwrap();

        assert_eq!(outcome.processed, 1);
        assert!(outcome.errors.is_empty());
        // Existence is not direction-gated; no new lot was created.
        assert_eq!(store.lot_count(), 1);
    }

    #[tokio::test]
    async fn inbound_unknown_serial_creates_exactly_one_lot() {
        let store = MemoryInventory::with_picking(PickingKind::Incoming, &[(100, 42, 2.0)]);
        let engine = Reconciler::new(&store);

        let outcome = engine.reconcile(1, &[entry(42, 100, "NEW1")]).await.unwrap();

        assert_eq!(outcome.processed, 1);
        assert_eq!(store.lot_count(), 1);
    }

    // -- partial failure isolation --------------------------------------------

    #[tokio::test]
    async fn malformed_entry_does_not_abort_siblings() {
        let store = MemoryInventory::with_picking(PickingKind::Incoming, &[(100, 42, 3.0)]);
        let engine = Reconciler::new(&store);

        let malformed = ScanEntry {
            product_id: Some(42),
            move_id: Some(100),
            serial: None,
            location: None,
        };
        let outcome = engine
            .reconcile(
                1,
                &[entry(42, 100, "SN1"), malformed, entry(42, 100, "SN3")],
            )
            .await
            .unwrap();

        // Entries after the malformed one are still processed.
        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].serial, "Unknown");
        assert_eq!(outcome.errors[0].kind, EntryErrorKind::MissingFields);
        assert_eq!(outcome.errors[0].kind.code(), "MISSING_FIELDS");
    }

    #[tokio::test]
    async fn move_from_other_picking_rejected() {
        let store = MemoryInventory::with_picking(PickingKind::Incoming, &[(100, 42, 1.0)]);
        {
            let mut inner = store.inner.lock().unwrap();
            inner.pickings.push(PickingHeader {
                id: 2,
                name: "WH/TEST/0002".to_string(),
                kind: PickingKind::Incoming,
                state: PickingState::Assigned,
                company_id: 1,
            });
            inner.moves.push((
                MoveHeader {
                    id: 200,
                    picking_id: 2,
                    product_id: 42,
                    source_location_id: 10,
                    dest_location_id: 20,
                },
                1.0,
            ));
        }
        let engine = Reconciler::new(&store);

        let outcome = engine.reconcile(1, &[entry(42, 200, "SN1")]).await.unwrap();

        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.errors[0].kind, EntryErrorKind::InvalidMove);
        assert_eq!(outcome.errors[0].kind.code(), "INVALID_MOVE");
    }

    // -- completion decision --------------------------------------------------

    #[tokio::test]
    async fn satisfying_one_of_two_moves_leaves_state() {
        let store = MemoryInventory::with_picking(
            PickingKind::Incoming,
            &[(100, 42, 1.0), (101, 43, 1.0)],
        );
        let engine = Reconciler::new(&store);

        let outcome = engine.reconcile(1, &[entry(42, 100, "SN1")]).await.unwrap();

        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.state, PickingState::Assigned);
        assert_eq!(store.last_sync(), Some((SyncStatus::Synced, None)));
    }

    #[tokio::test]
    async fn satisfying_both_moves_validates_picking() {
        let store = MemoryInventory::with_picking(
            PickingKind::Incoming,
            &[(100, 42, 1.0), (101, 43, 1.0)],
        );
        let engine = Reconciler::new(&store);

        let outcome = engine
            .reconcile(1, &[entry(42, 100, "SN1"), entry(43, 101, "SN2")])
            .await
            .unwrap();

        assert_eq!(outcome.state, PickingState::Done);
    }

    #[tokio::test]
    async fn done_picking_is_not_reevaluated() {
        let store = MemoryInventory::with_picking(PickingKind::Incoming, &[(100, 42, 1.0)]);
        store
            .inner
            .lock()
            .unwrap()
            .pickings[0]
            .state = PickingState::Done;
        let engine = Reconciler::new(&store);

        let outcome = engine.reconcile(1, &[]).await.unwrap();

        assert_eq!(outcome.state, PickingState::Done);
        // Sync status is still recorded for the batch.
        assert_eq!(store.last_sync(), Some((SyncStatus::Synced, None)));
    }

    #[tokio::test]
    async fn rejected_validation_does_not_fail_batch() {
        let mut store = MemoryInventory::with_picking(PickingKind::Incoming, &[(100, 42, 1.0)]);
        store.reject_validation = true;
        let engine = Reconciler::new(&store);

        let outcome = engine.reconcile(1, &[entry(42, 100, "SN1")]).await.unwrap();

        // The entry itself succeeded; the picking just stays open.
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.state, PickingState::Assigned);
        assert_eq!(store.last_sync(), Some((SyncStatus::Synced, None)));
    }

    #[tokio::test]
    async fn evaluator_fault_recorded_as_sync_error() {
        let mut store = MemoryInventory::with_picking(PickingKind::Incoming, &[(100, 42, 1.0)]);
        store.fail_progress = true;
        let engine = Reconciler::new(&store);

        let outcome = engine.reconcile(1, &[entry(42, 100, "SN1")]).await.unwrap();

        assert_eq!(outcome.processed, 1);
        let (status, error) = store.last_sync().unwrap();
        assert_eq!(status, SyncStatus::Error);
        assert!(error.unwrap().contains("progress query failed"));
    }

    // -- top-level failures ---------------------------------------------------

    #[tokio::test]
    async fn unknown_picking_aborts_batch() {
        let store = MemoryInventory::default();
        let engine = Reconciler::new(&store);

        assert_matches!(
            engine.reconcile(99, &[entry(42, 100, "SN1")]).await,
            Err(ReconcileError::PickingNotFound(99))
        );
    }

    // -- location hint --------------------------------------------------------

    #[tokio::test]
    async fn location_hint_recorded_on_picking() {
        let store = MemoryInventory::with_picking(PickingKind::Incoming, &[(100, 42, 2.0)]);
        let engine = Reconciler::new(&store);

        let mut with_hint = entry(42, 100, "SN1");
        with_hint.location = Some("A-01-03".to_string());
        engine.reconcile(1, &[with_hint]).await.unwrap();

        let inner = store.inner.lock().unwrap();
        assert_eq!(inner.hints, vec![(1, "A-01-03".to_string())]);
    }
}
