// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
///
/// Upstream variants carry a stable, caller-facing message such as
/// "Failed to create post". Raw store or media errors are logged where
/// they are caught and never placed in these messages.
#[derive(Debug)]
pub enum AppError {
    // 400 Bad Request, raised before any store call
    Validation(String),

    // 404 Not Found
    NotFound(String),

    // 400 Bad Request (store create/update/delete failed)
    UpstreamWrite(String),

    // 500 Internal Server Error (store read failed)
    UpstreamRead(String),

    // 400 Bad Request (cover image could not be uploaded)
    MediaUpload(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 409 Conflict (e.g., duplicate category name)
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::UpstreamWrite(_) | AppError::MediaUpload(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UpstreamRead(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a `{statusCode, message}` JSON body.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::UpstreamWrite(msg)
            | AppError::UpstreamRead(msg)
            | AppError::MediaUpload(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg) => msg,
        };
        let body = Json(json!({
            "statusCode": status.as_u16(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
