//! HTTP error responses.
//!
//! `/api/*` endpoints answer `{success: false, message, details}`. The OAuth
//! redirect endpoints are opened in a browser and answer plain text.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::{IntegrationError, StoreError};

/// Error type for the JSON endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Client-correctable input problem.
    #[error("{message}: {details}")]
    Validation { message: String, details: String },

    #[error("{message}: {details}")]
    NotFound { message: String, details: String },

    /// The owner email or business slug already has an onboarding.
    #[error("Duplicate submission for token {token}")]
    Duplicate {
        token: String,
        integrate_link: String,
    },

    /// A matching submission is still being handed off and may yet be
    /// rolled back, so no token is disclosed.
    #[error("Submission already in progress")]
    InProgress,

    /// A third-party integration is missing or failed.
    #[error("{message}: {source}")]
    Upstream {
        message: String,
        source: IntegrationError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn upstream(message: impl Into<String>, source: IntegrationError) -> Self {
        Self::Upstream {
            message: message.into(),
            source,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                json!({"success": false, "message": message, "details": details}),
            ),
            ApiError::NotFound { message, details } => (
                StatusCode::NOT_FOUND,
                json!({"success": false, "message": message, "details": details}),
            ),
            ApiError::Duplicate {
                token,
                integrate_link,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "success": false,
                    "message": "This business or email is already registered",
                    "details": "Use the existing integration link to connect WhatsApp",
                    "token": token,
                    "integrateLink": integrate_link,
                }),
            ),
            ApiError::InProgress => (
                StatusCode::CONFLICT,
                json!({
                    "success": false,
                    "message": "A submission for this business or email is already being processed",
                    "details": "Please try again in a few seconds",
                }),
            ),
            ApiError::Upstream { message, source } => {
                tracing::error!(error = %source, "{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"success": false, "message": message, "details": source.to_string()}),
                )
            }
            ApiError::Store(err) => {
                tracing::error!(error = %err, "Onboarding store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "success": false,
                        "message": "Internal server error",
                        "details": "An internal error occurred",
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Plain-text error for browser-facing OAuth endpoints.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Upstream(#[from] IntegrationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, text) = match self {
            PageError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            PageError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            PageError::Upstream(err) => {
                tracing::error!(error = %err, "OAuth integration failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not complete the WhatsApp connection. Please try again later.".to_string(),
                )
            }
            PageError::Store(err) => {
                tracing::error!(error = %err, "Onboarding store error during OAuth");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, text).into_response()
    }
}
