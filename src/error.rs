// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Responses are plain text: the frontend consumes the exact message
//! strings, so upstream provider/store messages pass through verbatim
//! rather than being wrapped in a structured envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Token missing or failed verification on a token-gated route.
    #[error("Unauthorized")]
    Unauthorized,

    /// Token missing or failed verification on an admin-gated route.
    #[error("Unauthorized")]
    Forbidden,

    /// Verified token without the admin role.
    #[error("Admin access only")]
    AdminOnly,

    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(String),

    /// Duplicate email at signup.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Identity-provider or document-store failure, surfaced verbatim.
    #[error("{0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden | AppError::AdminOnly => StatusCode::FORBIDDEN,
            AppError::Validation(_) | AppError::Upstream(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unknown error occurred".to_string(),
                )
                    .into_response();
            }
        };

        (status, self.to_string()).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (AppError::AdminOnly, StatusCode::FORBIDDEN),
            (
                AppError::Validation("Missing fields: email".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Conflict("User already exists".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                AppError::NotFound("User not found".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Upstream("EMAIL_EXISTS".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_admin_gate_messages() {
        assert_eq!(AppError::Forbidden.to_string(), "Unauthorized");
        assert_eq!(AppError::AdminOnly.to_string(), "Admin access only");
    }
}
