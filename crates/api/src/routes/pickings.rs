//! Route definitions for the `/pickings` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::pickings;
use crate::state::AppState;

/// Routes mounted at `/pickings`.
///
/// ```text
/// POST /list            -> list
/// POST /{id}/update_sn  -> update_sn
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(pickings::list))
        .route("/{id}/update_sn", post(pickings::update_sn))
}
