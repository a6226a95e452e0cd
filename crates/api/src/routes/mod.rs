pub mod auth;
pub mod health;
pub mod pickings;
pub mod serials;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                  login (public)
/// /auth/validate               validate a session token (public)
/// /auth/logout                 revoke a session token (public)
///
/// /pickings/list               work queue for the scanner
/// /pickings/{id}/update_sn     serial batch sync
///
/// /serials/check               single serial lookup
/// /serials/batch_check         bulk serial lookup
/// /serials/history             movement history for a serial
/// ```
///
/// Everything below `/pickings` and `/serials` requires a session token
/// in the request body.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/pickings", pickings::router())
        .nest("/serials", serials::router())
}
