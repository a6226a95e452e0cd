//! Authentication helpers: password hashing and session checks.

pub mod password;

use stockscan_core::session::{AuthError, Session, SessionService};
use stockscan_db::store::PgSessionStore;

use crate::error::AppError;
use crate::state::AppState;

/// Build the session service backed by the app's database pool.
pub fn session_service(state: &AppState) -> SessionService<PgSessionStore> {
    SessionService::new(
        PgSessionStore::new(state.pool.clone()),
        state.config.session_ttl_hours,
    )
}

/// Validate the token sent in a request body and return its session.
///
/// Every failure mode the client can cause (missing, unknown, expired)
/// collapses into [`AppError::InvalidToken`]; only store failures are
/// surfaced as internal errors.
pub async fn require_session(state: &AppState, token: &str) -> Result<Session, AppError> {
    if token.is_empty() {
        return Err(AppError::InvalidToken);
    }
    match session_service(state).validate(token).await {
        Ok(session) => Ok(session),
        Err(AuthError::Invalid | AuthError::Expired) => Err(AppError::InvalidToken),
        Err(AuthError::Store(err)) => Err(AppError::InternalError(err.to_string())),
    }
}
