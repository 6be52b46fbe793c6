use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Template requires a Pro or Ultimate plan")]
    TemplateNotAllowed,

    #[error("Out of tokens")]
    OutOfTokens,

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Invalid token pack: {0}")]
    InvalidTokenPack(u32),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found")]
    NotFound,

    /// The resource exists but belongs to another account.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Cache error")
            }
            AppError::Auth(ref msg) => (StatusCode::UNAUTHORIZED, msg.as_str()),
            AppError::Validation(ref msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::RateLimit => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded"),
            AppError::TemplateNotAllowed => (
                StatusCode::FORBIDDEN,
                "This template is only available for Pro or Ultimate users.",
            ),
            AppError::OutOfTokens => (
                StatusCode::PAYMENT_REQUIRED,
                "You're out of tokens. Please buy more or wait for your daily reset.",
            ),
            AppError::InvalidPlan(_) => (StatusCode::BAD_REQUEST, "Invalid upgrade option."),
            AppError::InvalidTokenPack(_) => {
                (StatusCode::BAD_REQUEST, "Invalid token pack selected.")
            }
            AppError::Storage(ref msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error")
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Resource not found"),
            AppError::Unauthorized => (
                StatusCode::FORBIDDEN,
                "You do not have access to this resource",
            ),
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_client_statuses() {
        let cases = [
            (AppError::TemplateNotAllowed, StatusCode::FORBIDDEN),
            (AppError::OutOfTokens, StatusCode::PAYMENT_REQUIRED),
            (AppError::InvalidPlan("gold".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidTokenPack(3), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized, StatusCode::FORBIDDEN),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::Auth("nope".into()), StatusCode::UNAUTHORIZED),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
