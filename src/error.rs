use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Not found")]
    NotFound,

    #[error("Cache entry corrupt: {0}")]
    CacheCorrupt(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed remote document: {0}")]
    MalformedDocument(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Offline")]
    Offline,

    #[error("No active user")]
    Unauthenticated,

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Sign in first".to_string()),
            AppError::Offline => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Device is offline".to_string(),
            ),
            AppError::RemoteUnavailable(msg) => {
                error!("remote store error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Remote store unavailable".to_string(),
                )
            }
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            other => {
                error!("internal error: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}
