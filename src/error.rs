// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
///
/// The four upstream variants carry the provider's status code and the raw
/// response body so the dashboard can show them verbatim.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Token refresh failed: HTTP {status}")]
    TokenRefresh { status: u16, body: String },

    #[error("Athlete check failed: HTTP {status}")]
    SanityCheck { status: u16, body: String },

    #[error("Activity request failed: HTTP {status}")]
    ActivityFetch { status: u16, body: String },

    #[error("Heart-rate stream request failed: HTTP {status}")]
    StreamFetch { status: u16, body: String },

    #[error("Strava API error: {0}")]
    StravaApi(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True when the refresh credential itself was rejected, as opposed to a
    /// failed data call.
    pub fn is_token_refresh_error(&self) -> bool {
        matches!(self, AppError::TokenRefresh { .. })
    }

    /// Provider status code and body for upstream failures.
    pub fn upstream(&self) -> Option<(u16, &str)> {
        match self {
            AppError::TokenRefresh { status, body }
            | AppError::SanityCheck { status, body }
            | AppError::ActivityFetch { status, body }
            | AppError::StreamFetch { status, body } => Some((*status, body.as_str())),
            _ => None,
        }
    }

    /// Short machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::TokenRefresh { .. } => "token_refresh_failed",
            AppError::SanityCheck { .. } => "athlete_check_failed",
            AppError::ActivityFetch { .. } => "activity_fetch_failed",
            AppError::StreamFetch { .. } => "stream_fetch_failed",
            AppError::StravaApi(_) => "strava_error",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Internal(_) => "internal_error",
        }
    }
}

/// Interpret an upstream body as JSON when possible, falling back to the raw
/// text.
pub fn body_as_details(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, upstream_status, details) = match &self {
            AppError::TokenRefresh { status, body }
            | AppError::SanityCheck { status, body }
            | AppError::ActivityFetch { status, body }
            | AppError::StreamFetch { status, body } => {
                tracing::warn!(error = %self, body = %body, "Strava request failed");
                (StatusCode::BAD_GATEWAY, Some(*status), Some(body_as_details(body)))
            }
            AppError::StravaApi(msg) => {
                tracing::warn!(error = %msg, "Strava transport error");
                (
                    StatusCode::BAD_GATEWAY,
                    None,
                    Some(serde_json::Value::String(msg.clone())),
                )
            }
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                None,
                Some(serde_json::Value::String(msg.clone())),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                None,
                Some(serde_json::Value::String(msg.clone())),
            ),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, None, None)
            }
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            status: upstream_status,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
