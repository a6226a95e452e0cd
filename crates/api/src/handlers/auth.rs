//! Handlers for the `/auth` resource (login, validate, logout).

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use stockscan_core::error::CoreError;
use stockscan_core::types::{DbId, Timestamp};
use stockscan_db::repositories::user_repo::UserRepo;

use crate::auth::{password::verify_password, session_service};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for `POST /auth/validate` and `POST /auth/logout`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub token: String,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    /// Plaintext session token. Shown to the client exactly once.
    pub token: String,
    pub user_id: DbId,
    pub username: String,
    /// Display name, falling back to the username.
    pub name: String,
    pub expires_at: Timestamp,
}

/// Response for `POST /auth/validate`.
///
/// A failed validation is still a `success: true` response with
/// `valid: false`; the endpoint answers the question, it does not
/// gatekeep.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub success: bool,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

impl ValidateResponse {
    fn invalid() -> Self {
        Self {
            success: true,
            valid: false,
            user_id: None,
            expires_at: None,
            error_code: Some("INVALID_TOKEN"),
        }
    }
}

/// Response for `POST /auth/logout`.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/login
///
/// Authenticate with username + password. Returns an opaque session token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    // 1. Both credentials must be present.
    if input.username.is_empty() || input.password.is_empty() {
        return Err(AppError::MissingCredentials);
    }

    // 2. Find the user. Unknown usernames and wrong passwords are
    //    indistinguishable to the client.
    let user = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !user.is_active {
        return Err(AppError::InvalidCredentials);
    }

    // 3. Verify password.
    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(AppError::InvalidCredentials);
    }

    // 4. The account must be allowed to run stock operations.
    if !user.has_stock_access {
        return Err(AppError::Core(CoreError::Forbidden(
            "User has no access to stock operations".into(),
        )));
    }

    // 5. Issue a session. Additive: other devices stay logged in.
    let issued = session_service(&state)
        .issue(user.id)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    tracing::info!(user_id = user.id, username = %user.username, "Mobile login");

    Ok(Json(LoginResponse {
        success: true,
        token: issued.token,
        user_id: user.id,
        name: user.display_name.unwrap_or_else(|| user.username.clone()),
        username: user.username,
        expires_at: issued.session.expires_at,
    }))
}

/// POST /api/auth/validate
///
/// Check whether a session token is still valid.
pub async fn validate(
    State(state): State<AppState>,
    Json(input): Json<TokenRequest>,
) -> AppResult<Json<ValidateResponse>> {
    if input.token.is_empty() {
        return Ok(Json(ValidateResponse::invalid()));
    }

    let session = match session_service(&state).validate(&input.token).await {
        Ok(session) => session,
        Err(stockscan_core::session::AuthError::Store(e)) => {
            return Err(AppError::InternalError(e.to_string()))
        }
        Err(_) => return Ok(Json(ValidateResponse::invalid())),
    };

    // A session whose user has since been removed or deactivated is invalid.
    match UserRepo::find_by_id(&state.pool, session.user_id).await? {
        Some(user) if user.is_active => {}
        _ => return Ok(Json(ValidateResponse::invalid())),
    }

    Ok(Json(ValidateResponse {
        success: true,
        valid: true,
        user_id: Some(session.user_id),
        expires_at: Some(session.expires_at),
        error_code: None,
    }))
}

/// POST /api/auth/logout
///
/// Revoke a session. Succeeds whether or not the token was known, so the
/// client can always clear its local state.
pub async fn logout(
    State(state): State<AppState>,
    Json(input): Json<TokenRequest>,
) -> AppResult<Json<LogoutResponse>> {
    if !input.token.is_empty() {
        session_service(&state)
            .revoke(&input.token)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
    }

    Ok(Json(LogoutResponse {
        success: true,
        message: "Logged out successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- request shapes -------------------------------------------------------

    #[test]
    fn login_request_parses() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"username": "scanner1", "password": "pw"}"#).unwrap();
        assert_eq!(req.username, "scanner1");
        assert_eq!(req.password, "pw");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        // Missing credentials are a protocol error, not a deserialization error.
        let req: LoginRequest = serde_json::from_str("{}").unwrap();
        assert!(req.username.is_empty());
        assert!(req.password.is_empty());

        let req: TokenRequest = serde_json::from_str("{}").unwrap();
        assert!(req.token.is_empty());
    }

    // -- response shapes ------------------------------------------------------

    #[test]
    fn invalid_validate_response_omits_user_fields() {
        let value = serde_json::to_value(ValidateResponse::invalid()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["valid"], false);
        assert_eq!(value["error_code"], "INVALID_TOKEN");
        assert!(value.get("user_id").is_none());
        assert!(value.get("expires_at").is_none());
    }

    #[test]
    fn valid_validate_response_omits_error_code() {
        let response = ValidateResponse {
            success: true,
            valid: true,
            user_id: Some(7),
            expires_at: Some(chrono::Utc::now()),
            error_code: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["valid"], true);
        assert_eq!(value["user_id"], 7);
        assert!(value.get("error_code").is_none());
    }
}
