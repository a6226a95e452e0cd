//! Route definitions for the `/serials` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::serials;
use crate::state::AppState;

/// Routes mounted at `/serials`.
///
/// ```text
/// POST /check        -> check
/// POST /batch_check  -> batch_check
/// POST /history      -> history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check", post(serials::check))
        .route("/batch_check", post(serials::batch_check))
        .route("/history", post(serials::history))
}
