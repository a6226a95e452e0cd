//! Handlers for the `/serials` resource: existence checks and movement
//! history for individual serial numbers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use stockscan_core::types::{DbId, Timestamp};
use stockscan_db::repositories::lot_repo::LotRepo;
use stockscan_db::repositories::move_line_repo::MoveLineRepo;
use stockscan_db::repositories::quant_repo::QuantRepo;

use crate::auth::require_session;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Default number of movements returned by the history endpoint.
const DEFAULT_HISTORY_LIMIT: i64 = 10;

/// Hard cap on the history page size.
const MAX_HISTORY_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /serials/check` and `POST /serials/history`.
#[derive(Debug, Deserialize)]
pub struct SerialRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub serial_number: String,
    /// Narrow the lookup to one product; ignored by `history`.
    pub product_id: Option<DbId>,
    /// History page size; ignored by `check`.
    pub limit: Option<i64>,
}

/// Request body for `POST /serials/batch_check`.
#[derive(Debug, Deserialize)]
pub struct BatchCheckRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub serial_numbers: Vec<String>,
    pub product_id: Option<DbId>,
}

/// Product info attached to a found serial.
#[derive(Debug, Serialize)]
pub struct SerialProduct {
    pub id: DbId,
    pub name: String,
    pub default_code: Option<String>,
}

/// Stock picture of a found serial.
#[derive(Debug, Serialize)]
pub struct SerialInfo {
    pub product: SerialProduct,
    pub available_qty: f64,
    pub reserved_qty: f64,
    /// Location holding the largest share of the lot, when on hand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move_date: Option<Timestamp>,
}

/// Existence answer for one serial.
#[derive(Debug, Serialize)]
pub struct SerialStatus {
    pub serial_number: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_info: Option<SerialInfo>,
}

/// Response for `POST /serials/check`.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub success: bool,
    #[serde(flatten)]
    pub status: SerialStatus,
}

/// Response for `POST /serials/batch_check`.
#[derive(Debug, Serialize)]
pub struct BatchCheckResponse {
    pub success: bool,
    pub results: Vec<SerialStatus>,
    pub total_checked: usize,
}

/// One movement in the history response.
#[derive(Debug, Serialize)]
pub struct MovementItem {
    pub picking: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: String,
    pub qty: f64,
    pub date: Timestamp,
    pub source_location: String,
    pub dest_location: String,
}

/// Response for `POST /serials/history`.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub serial_number: String,
    pub movements: Vec<MovementItem>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/serials/check
///
/// Look up one serial number. An unknown serial is an `exists: false`
/// answer, not an error.
pub async fn check(
    State(state): State<AppState>,
    Json(input): Json<SerialRequest>,
) -> AppResult<Json<CheckResponse>> {
    require_session(&state, &input.token).await?;

    if input.serial_number.is_empty() {
        return Err(AppError::BadRequest {
            code: "MISSING_SERIAL_NUMBER",
            message: "Serial number is required".to_string(),
        });
    }

    let status = serial_status(&state.pool, input.serial_number, input.product_id).await?;

    Ok(Json(CheckResponse {
        success: true,
        status,
    }))
}

/// POST /api/serials/batch_check
///
/// Look up several serial numbers in one round trip. Order of results
/// matches the order of the request.
pub async fn batch_check(
    State(state): State<AppState>,
    Json(input): Json<BatchCheckRequest>,
) -> AppResult<Json<BatchCheckResponse>> {
    require_session(&state, &input.token).await?;

    if input.serial_numbers.is_empty() {
        return Err(AppError::BadRequest {
            code: "MISSING_SERIAL_NUMBERS",
            message: "No serial numbers provided".to_string(),
        });
    }

    let mut results = Vec::with_capacity(input.serial_numbers.len());
    for serial in input.serial_numbers {
        results.push(serial_status(&state.pool, serial, input.product_id).await?);
    }

    Ok(Json(BatchCheckResponse {
        success: true,
        total_checked: results.len(),
        results,
    }))
}

/// POST /api/serials/history
///
/// Movement history for a serial, newest first. Unlike `check`, an
/// unknown serial here is an error.
pub async fn history(
    State(state): State<AppState>,
    Json(input): Json<SerialRequest>,
) -> AppResult<Json<HistoryResponse>> {
    require_session(&state, &input.token).await?;

    if input.serial_number.is_empty() {
        return Err(AppError::BadRequest {
            code: "MISSING_SERIAL_NUMBER",
            message: "Serial number is required".to_string(),
        });
    }

    let lot = LotRepo::find_by_serial(&state.pool, &input.serial_number, None)
        .await?
        .ok_or_else(|| AppError::SerialNotFound(input.serial_number.clone()))?;

    let limit = input
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let movements = MoveLineRepo::history_for_lot(&state.pool, lot.id, limit)
        .await?
        .into_iter()
        .map(|m| MovementItem {
            picking: m.picking_name,
            kind: m.kind,
            state: m.state,
            qty: m.qty,
            date: m.done_at,
            source_location: m.source_location,
            dest_location: m.dest_location,
        })
        .collect();

    Ok(Json(HistoryResponse {
        success: true,
        serial_number: input.serial_number,
        movements,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve one serial's existence and stock picture.
async fn serial_status(
    pool: &PgPool,
    serial: String,
    product_id: Option<DbId>,
) -> Result<SerialStatus, AppError> {
    let Some(lot) = LotRepo::find_by_serial(pool, &serial, product_id).await? else {
        return Ok(SerialStatus {
            serial_number: serial,
            exists: false,
            serial_info: None,
        });
    };

    let summary = QuantRepo::summary_for_lot(pool, lot.id).await?;
    let location = QuantRepo::top_location_for_lot(pool, lot.id).await?;
    let last_move_date = MoveLineRepo::last_move_date(pool, lot.id).await?;

    Ok(SerialStatus {
        serial_number: serial,
        exists: true,
        serial_info: Some(SerialInfo {
            product: SerialProduct {
                id: lot.product_id,
                name: lot.product_name,
                default_code: lot.default_code,
            },
            available_qty: summary.total_qty - summary.reserved_qty,
            reserved_qty: summary.reserved_qty,
            location,
            last_move_date,
        }),
    })
}
