use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// True when the underlying database error is a unique-constraint
    /// violation (e.g. a duplicate user email).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = if self.is_unique_violation() {
            (StatusCode::CONFLICT, "Duplicate value for a unique field")
        } else {
            match &self {
                AppError::Database(e) => {
                    error!("Database error: {e}");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
                AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
                AppError::NotFound => (StatusCode::NOT_FOUND, "Not found"),
                AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
                AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
                AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
