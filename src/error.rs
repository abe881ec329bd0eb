use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Request failure categories, each rendered as `{success: false, message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    #[error("Insufficient credits")]
    InsufficientCredits,

    #[error("{0}")]
    Conflict(String),

    /// Store or gateway failure; the cause is logged, never returned.
    #[error("{0}")]
    Internal(String),
}

/// Fixed-shape error envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InsufficientCredits => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            message: self.to_string(),
        });
        (self.status(), body).into_response()
    }
}

/// Logs `err` and collapses it into a generic 500 carrying `message`.
pub fn internal(message: &'static str) -> impl FnOnce(anyhow::Error) -> ApiError {
    move |err| {
        error!(error = %err, "{}", message);
        ApiError::Internal(message.to_string())
    }
}
