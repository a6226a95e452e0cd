use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use stockscan_core::error::CoreError;
use stockscan_core::types::DbId;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds the mobile protocol's
/// named failure cases. Implements [`IntoResponse`] to produce the
/// `{"success": false, "error": ..., "error_code": ...}` envelope the
/// scanner app expects on every failure.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `stockscan_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The presented session token is unknown or expired.
    #[error("Invalid or expired session token")]
    InvalidToken,

    /// Login attempted without a username or password.
    #[error("Username and password are required")]
    MissingCredentials,

    /// Login attempted with a wrong username/password pair.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The requested picking does not exist.
    #[error("Picking {0} not found")]
    PickingNotFound(DbId),

    /// The requested serial number has no identity in the system.
    #[error("Serial number '{0}' not found")]
    SerialNotFound(String),

    /// A bad request carrying a protocol-specific error code.
    #[error("{message}")]
    BadRequest {
        code: &'static str,
        message: String,
    },

    /// An internal error with a human-readable message. The message is
    /// logged, never sent to the client.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Forbidden(msg) => (
                    StatusCode::FORBIDDEN,
                    "INSUFFICIENT_PERMISSIONS",
                    msg.clone(),
                ),
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- Protocol errors ---
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                self.to_string(),
            ),
            AppError::MissingCredentials => (
                StatusCode::BAD_REQUEST,
                "MISSING_CREDENTIALS",
                self.to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                self.to_string(),
            ),
            AppError::PickingNotFound(_) => {
                (StatusCode::NOT_FOUND, "PICKING_NOT_FOUND", self.to_string())
            }
            AppError::SerialNotFound(_) => {
                (StatusCode::NOT_FOUND, "SERIAL_NOT_FOUND", self.to_string())
            }
            AppError::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, *code, message.clone())
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SERVER_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "success": false,
            "error": message,
            "error_code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERVER_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERVER_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn envelope(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn invalid_token_envelope() {
        let (status, body) = envelope(AppError::InvalidToken).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "INVALID_TOKEN");
        assert_eq!(body["error"], "Invalid or expired session token");
    }

    #[tokio::test]
    async fn missing_credentials_envelope() {
        let (status, body) = envelope(AppError::MissingCredentials).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "MISSING_CREDENTIALS");
    }

    #[tokio::test]
    async fn picking_not_found_envelope() {
        let (status, body) = envelope(AppError::PickingNotFound(42)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_code"], "PICKING_NOT_FOUND");
        assert_eq!(body["error"], "Picking 42 not found");
    }

    #[tokio::test]
    async fn serial_not_found_envelope() {
        let (status, body) = envelope(AppError::SerialNotFound("SN-1".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_code"], "SERIAL_NOT_FOUND");
        assert_eq!(body["error"], "Serial number 'SN-1' not found");
    }

    #[tokio::test]
    async fn bad_request_carries_protocol_code() {
        let (status, body) = envelope(AppError::BadRequest {
            code: "MISSING_SERIAL_NUMBERS",
            message: "No serial numbers provided".into(),
        })
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "MISSING_SERIAL_NUMBERS");
    }

    #[tokio::test]
    async fn internal_error_is_sanitized() {
        let (status, body) = envelope(AppError::InternalError("pool exhausted".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error_code"], "SERVER_ERROR");
        // The internal detail is logged, never leaked.
        assert_eq!(body["error"], "An internal error occurred");
    }

    #[tokio::test]
    async fn forbidden_maps_to_insufficient_permissions() {
        let (status, body) = envelope(AppError::Core(CoreError::Forbidden(
            "User has no access to stock operations".into(),
        )))
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "INSUFFICIENT_PERMISSIONS");
        assert_eq!(body["error"], "User has no access to stock operations");
    }

    #[tokio::test]
    async fn validation_error_envelope() {
        let (status, body) =
            envelope(AppError::Core(CoreError::Validation("Unknown picking type: 'x'".into())))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "VALIDATION_ERROR");
        assert_eq!(body["error"], "Unknown picking type: 'x'");
    }
}
