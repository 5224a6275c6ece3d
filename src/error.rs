// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Message returned for any failure whose detail must stay server-side.
const GENERAL_ERROR_MESSAGE: &str = "Server encountered a general error.";

/// Message returned when the identification API fails or misbehaves.
pub const UPSTREAM_ERROR_MESSAGE: &str = "External AI API Error";

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed input fields.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    /// Duplicate value for a field the store keeps unique.
    #[error("{0}")]
    Conflict(String),

    /// Missing, invalid or expired token, or the token's user is gone.
    #[error("{0}")]
    Unauthenticated(String),

    #[error("Invalid Credentials")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    /// Request body exceeded the configured upload limit.
    #[error("Uploaded image is too large.")]
    PayloadTooLarge,

    /// The identification API failed, timed out, or returned an unusable payload.
    #[error("External AI API error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub const NO_TOKEN: &'static str = "Not authorized, no token";
    pub const TOKEN_FAILED: &'static str = "Not authorized, token failed";
    pub const USER_NOT_FOUND: &'static str = "Not authorized, user not found";

    /// Upstream failure that carries no response body (network error, timeout, bad payload).
    pub fn upstream(message: impl Into<String>) -> Self {
        AppError::Upstream {
            status: None,
            message: message.into(),
            details: None,
        }
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthenticated(_) | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, details) = match self {
            AppError::Upstream {
                status: upstream_status,
                message,
                details,
            } => {
                tracing::warn!(
                    upstream_status = ?upstream_status,
                    error = %message,
                    "Identification API failure"
                );
                // Forward whatever the upstream said; fall back to our own description.
                let details = details.or(Some(serde_json::Value::String(message)));
                (UPSTREAM_ERROR_MESSAGE.to_string(), details)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (GENERAL_ERROR_MESSAGE.to_string(), None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (GENERAL_ERROR_MESSAGE.to_string(), None)
            }
            other => (other.to_string(), None),
        };

        let body = ErrorResponse {
            success: false,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(_: MultipartRejection) -> Self {
        AppError::BadRequest("No image file uploaded.".to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::BadRequest(err.body_text())
        }
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
