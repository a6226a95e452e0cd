//! Handlers for the `/pickings` resource: the scanner's work queue and
//! the serial batch sync endpoint.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use stockscan_core::error::CoreError;
use stockscan_core::picking::{PickingKind, PickingState};
use stockscan_core::reconcile::{ReconcileError, Reconciler, ScanEntry};
use stockscan_core::types::{DbId, Timestamp};
use stockscan_db::models::picking::PickingListItem;
use stockscan_db::repositories::move_line_repo::MoveLineRepo;
use stockscan_db::repositories::move_repo::MoveRepo;
use stockscan_db::repositories::picking_repo::{PickingFilter, PickingRepo};
use stockscan_db::store::PgInventoryStore;

use crate::auth::require_session;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Default page size for the picking list.
const DEFAULT_LIMIT: i64 = 50;

/// Hard cap on the picking list page size.
const MAX_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /pickings/list`.
#[derive(Debug, Deserialize)]
pub struct ListPickingsRequest {
    #[serde(default)]
    pub token: String,
    /// Optional state filter. Defaults to the open states.
    pub state: Option<String>,
    /// Optional direction filter: `in`, `out`, or `internal`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One scanned serial in a `POST /pickings/{id}/update_sn` batch.
#[derive(Debug, Deserialize)]
pub struct SerialEntry {
    pub product_id: Option<DbId>,
    pub move_id: Option<DbId>,
    pub serial_number: Option<String>,
    pub location: Option<String>,
}

/// Request body for `POST /pickings/{id}/update_sn`.
#[derive(Debug, Deserialize)]
pub struct UpdateSnRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub serial_numbers: Vec<SerialEntry>,
}

/// One product line of a picking, with progress and the serials already
/// scanned against its move.
#[derive(Debug, Serialize)]
pub struct ProductLine {
    pub move_id: DbId,
    pub product_id: DbId,
    pub product_name: String,
    pub default_code: Option<String>,
    pub barcode: Option<String>,
    pub tracking: String,
    pub uom_name: String,
    pub expected_qty: f64,
    pub done_qty: f64,
    pub serial_numbers: Vec<String>,
}

/// One picking in the list response.
#[derive(Debug, Serialize)]
pub struct PickingItem {
    pub id: DbId,
    pub name: String,
    /// Direction as the client displays it: `in`, `out`, or `internal`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub state: String,
    pub scheduled_date: Option<Timestamp>,
    pub origin: Option<String>,
    pub partner_name: Option<String>,
    pub source_location: String,
    pub dest_location: String,
    pub sync_status: String,
    pub lines: Vec<ProductLine>,
}

/// Response for `POST /pickings/list`.
#[derive(Debug, Serialize)]
pub struct ListPickingsResponse {
    pub success: bool,
    pub pickings: Vec<PickingItem>,
    /// Total matches ignoring pagination.
    pub total_count: i64,
    pub limit: i64,
    pub offset: i64,
}

/// One rejected entry in the batch sync response.
#[derive(Debug, Serialize)]
pub struct SerialError {
    pub serial_number: String,
    pub error: String,
    pub error_code: &'static str,
}

/// Response for `POST /pickings/{id}/update_sn`.
#[derive(Debug, Serialize)]
pub struct UpdateSnResponse {
    pub success: bool,
    /// Entries that produced a movement line.
    pub processed: usize,
    pub errors: Vec<SerialError>,
    pub picking_state: &'static str,
    pub picking_name: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/pickings/list
///
/// List pickings for the scanner's work queue, open states by default,
/// newest schedule first. Each picking carries its product lines with
/// progress so the client needs no follow-up request.
pub async fn list(
    State(state): State<AppState>,
    Json(input): Json<ListPickingsRequest>,
) -> AppResult<Json<ListPickingsResponse>> {
    require_session(&state, &input.token).await?;

    let filter = build_filter(&input)?;

    let total_count = PickingRepo::count(&state.pool, &filter).await?;
    let rows = PickingRepo::list(&state.pool, &filter).await?;

    let mut pickings = Vec::with_capacity(rows.len());
    for row in rows {
        let lines = product_lines(&state.pool, row.id).await?;
        pickings.push(picking_item(row, lines)?);
    }

    Ok(Json(ListPickingsResponse {
        success: true,
        pickings,
        total_count,
        limit: filter.limit,
        offset: filter.offset,
    }))
}

/// POST /api/pickings/{id}/update_sn
///
/// Reconcile a batch of scanned serials against the picking. Entries are
/// processed independently; the response reports per-entry failures and
/// the picking's state after the completion evaluator ran.
pub async fn update_sn(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSnRequest>,
) -> AppResult<Json<UpdateSnResponse>> {
    require_session(&state, &input.token).await?;

    if input.serial_numbers.is_empty() {
        return Err(AppError::BadRequest {
            code: "MISSING_SERIAL_NUMBERS",
            message: "No serial numbers provided".to_string(),
        });
    }

    let entries: Vec<ScanEntry> = input
        .serial_numbers
        .into_iter()
        .map(|s| ScanEntry {
            product_id: s.product_id,
            move_id: s.move_id,
            serial: s.serial_number,
            location: s.location,
        })
        .collect();

    let store = PgInventoryStore::new(state.pool.clone());
    let outcome = Reconciler::new(&store)
        .reconcile(id, &entries)
        .await
        .map_err(|e| match e {
            ReconcileError::PickingNotFound(id) => AppError::PickingNotFound(id),
            ReconcileError::Store(err) => AppError::InternalError(err.to_string()),
        })?;

    let errors = outcome
        .errors
        .into_iter()
        .map(|e| SerialError {
            serial_number: e.serial,
            error_code: e.kind.code(),
            error: e.message,
        })
        .collect();

    Ok(Json(UpdateSnResponse {
        success: true,
        processed: outcome.processed,
        errors,
        picking_state: outcome.state.as_str(),
        picking_name: outcome.picking_name,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Translate the wire-level list request into a repository filter.
fn build_filter(input: &ListPickingsRequest) -> Result<PickingFilter, AppError> {
    let states = match &input.state {
        Some(state) => {
            PickingState::parse(state)?;
            vec![state.clone()]
        }
        None => vec!["assigned".to_string(), "partially_available".to_string()],
    };

    let kind = match input.kind.as_deref() {
        None => None,
        Some("in") => Some(PickingKind::Incoming.as_str().to_string()),
        Some("out") => Some(PickingKind::Outgoing.as_str().to_string()),
        Some("internal") => Some(PickingKind::Internal.as_str().to_string()),
        Some(other) => {
            return Err(CoreError::Validation(format!("Unknown picking type: '{other}'")).into())
        }
    };

    let limit = input.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = input.offset.unwrap_or(0).max(0);

    Ok(PickingFilter {
        states,
        kind,
        limit,
        offset,
    })
}

/// Build the product lines for one picking, serials grouped per move.
async fn product_lines(pool: &PgPool, picking_id: DbId) -> Result<Vec<ProductLine>, AppError> {
    let summaries = MoveRepo::lines_for_picking(pool, picking_id).await?;

    let mut serials_by_move: HashMap<DbId, Vec<String>> = HashMap::new();
    for scanned in MoveLineRepo::serials_for_picking(pool, picking_id).await? {
        serials_by_move
            .entry(scanned.move_id)
            .or_default()
            .push(scanned.serial);
    }

    Ok(summaries
        .into_iter()
        .map(|s| ProductLine {
            serial_numbers: serials_by_move.remove(&s.move_id).unwrap_or_default(),
            move_id: s.move_id,
            product_id: s.product_id,
            product_name: s.product_name,
            default_code: s.default_code,
            barcode: s.barcode,
            tracking: s.tracking,
            uom_name: s.uom_name,
            expected_qty: s.expected_qty,
            done_qty: s.done_qty,
        })
        .collect())
}

/// Map a database row to its wire form.
fn picking_item(row: PickingListItem, lines: Vec<ProductLine>) -> Result<PickingItem, AppError> {
    let kind =
        PickingKind::parse(&row.kind).map_err(|e| AppError::InternalError(e.to_string()))?;
    Ok(PickingItem {
        id: row.id,
        name: row.name,
        kind: kind.wire_str(),
        state: row.state,
        scheduled_date: row.scheduled_date,
        origin: row.origin,
        partner_name: row.partner_name,
        source_location: row.source_location,
        dest_location: row.dest_location,
        sync_status: row.sync_status,
        lines,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn list_request(json: &str) -> ListPickingsRequest {
        serde_json::from_str(json).unwrap()
    }

    // -- filter construction --------------------------------------------------

    #[test]
    fn filter_defaults_to_open_states() {
        let filter = build_filter(&list_request(r#"{"token": "t"}"#)).unwrap();
        assert_eq!(filter.states, vec!["assigned", "partially_available"]);
        assert_eq!(filter.kind, None);
        assert_eq!(filter.limit, DEFAULT_LIMIT);
        assert_eq!(filter.offset, 0);
    }

    #[test]
    fn filter_accepts_explicit_state() {
        let filter =
            build_filter(&list_request(r#"{"token": "t", "state": "done"}"#)).unwrap();
        assert_eq!(filter.states, vec!["done"]);
    }

    #[test]
    fn filter_translates_wire_type() {
        let filter = build_filter(&list_request(r#"{"token": "t", "type": "in"}"#)).unwrap();
        assert_eq!(filter.kind.as_deref(), Some("incoming"));

        let filter = build_filter(&list_request(r#"{"token": "t", "type": "out"}"#)).unwrap();
        assert_eq!(filter.kind.as_deref(), Some("outgoing"));
    }

    #[test]
    fn filter_rejects_unknown_type() {
        let err =
            build_filter(&list_request(r#"{"token": "t", "type": "sideways"}"#)).unwrap_err();
        assert_matches!(err, AppError::Core(CoreError::Validation(_)));
    }

    #[test]
    fn filter_rejects_unknown_state() {
        let err =
            build_filter(&list_request(r#"{"token": "t", "state": "teleported"}"#)).unwrap_err();
        assert_matches!(err, AppError::Core(CoreError::Validation(_)));
    }

    #[test]
    fn filter_clamps_limit() {
        let filter = build_filter(&list_request(r#"{"token": "t", "limit": 5000}"#)).unwrap();
        assert_eq!(filter.limit, MAX_LIMIT);

        let filter =
            build_filter(&list_request(r#"{"token": "t", "limit": 0, "offset": -3}"#)).unwrap();
        assert_eq!(filter.limit, 1);
        assert_eq!(filter.offset, 0);
    }

    // -- request shapes -------------------------------------------------------

    #[test]
    fn update_sn_request_parses() {
        let req: UpdateSnRequest = serde_json::from_str(
            r#"{
                "token": "t",
                "serial_numbers": [
                    {"product_id": 42, "move_id": 100, "serial_number": "SN1", "location": "A-01"},
                    {"move_id": 100, "serial_number": "SN2"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(req.serial_numbers.len(), 2);
        assert_eq!(req.serial_numbers[0].product_id, Some(42));
        assert_eq!(req.serial_numbers[0].location.as_deref(), Some("A-01"));
        // Absent fields deserialize to None and become per-entry errors.
        assert_eq!(req.serial_numbers[1].product_id, None);
    }

    // -- response shapes ------------------------------------------------------

    #[test]
    fn update_sn_response_shape() {
        let response = UpdateSnResponse {
            success: true,
            processed: 2,
            errors: vec![SerialError {
                serial_number: "SN3".into(),
                error: "Serial number not found in system".into(),
                error_code: "SERIAL_NOT_FOUND",
            }],
            picking_state: "done",
            picking_name: "WH/IN/0001".into(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["picking_name"], "WH/IN/0001");
        assert_eq!(value["picking_state"], "done");
        assert_eq!(value["errors"][0]["error_code"], "SERIAL_NOT_FOUND");
    }

    #[test]
    fn picking_item_uses_wire_type() {
        let row = PickingListItem {
            id: 1,
            name: "WH/IN/0001".into(),
            kind: "incoming".into(),
            state: "assigned".into(),
            scheduled_date: None,
            origin: None,
            partner_name: None,
            source_location: "Vendors".into(),
            dest_location: "WH/Stock".into(),
            sync_status: "pending".into(),
        };
        let item = picking_item(row, Vec::new()).unwrap();
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "in");
        assert!(value["lines"].as_array().unwrap().is_empty());
    }
}
