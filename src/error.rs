use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Convenience alias for handler and repository return types.
pub type AppResult<T> = Result<T, AppError>;

/// AppError
///
/// The error taxonomy shared by the gate, the handlers and the repository layer.
/// Every variant maps to exactly one HTTP status; internal details are logged and
/// never echoed back to the client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Login failure. Deliberately says nothing about which half was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, tampered or expired session token.
    #[error("Unauthorized")]
    InvalidSession,

    /// Authenticated, but the role lacks the required permission.
    #[error("Forbidden")]
    Forbidden,

    #[error("Not enough stock for product {product}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        product: String,
        available: i32,
        requested: i32,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::InvalidSession => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::InsufficientStock { .. } | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            // Gate rejections use the bare `{error}` shape.
            AppError::InvalidSession | AppError::Forbidden => json!({ "error": self.to_string() }),
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                json!({ "success": false, "error": "Internal server error" })
            }
            AppError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                json!({ "success": false, "error": "Internal server error" })
            }
            _ => json!({ "success": false, "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("bcrypt: {e}"))
    }
}
