//! Error types for the ReportLink proxy.
//!
//! * [`FlowError`]: failures of the token flow itself.  Never formats an
//!   HTTP response.
//! * [`ApiError`]: what handlers return; implements
//!   [`axum::response::IntoResponse`] and is the only place statuses are
//!   chosen.
//! * [`ConfigError`]: startup configuration problems.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reportlink_models::{ModelError, UpstreamErrorBody};
use serde_json::{Value, json};

use crate::upstream::Upstream;

/// Errors that can occur while acquiring an access or embed token.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// The identity authority rejected the exchange or returned no token.
    #[error("authentication with the identity authority failed (HTTP {status})")]
    Authentication {
        /// Upstream HTTP status.
        status: u16,
        /// Upstream response body.
        body: String,
    },

    /// The reporting service rejected the request or returned no token.
    #[error("embed token request was rejected by the reporting service (HTTP {status})")]
    EmbedToken {
        /// Upstream HTTP status.
        status: u16,
        /// Upstream response body.
        body: String,
    },

    /// Every attempt against the upstream timed out.
    #[error("{upstream} did not answer in time after {attempts} attempt(s)")]
    Timeout {
        /// Which upstream hung.
        upstream: Upstream,
        /// Number of attempts made.
        attempts: u32,
    },

    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("failed to reach upstream: {0}")]
    Transport(#[from] reqwest::Error),

    /// The embed-token request could not be built.
    #[error("invalid embed-token request: {0}")]
    InvalidRequest(#[from] ModelError),
}

impl FlowError {
    /// Status propagated to the caller by the report-details route.
    ///
    /// Upstream 4xx/5xx statuses pass through; an upstream that answered
    /// without a usable token maps to `502`.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Authentication { status, .. } | Self::EmbedToken { status, .. } => {
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Transport(_) | Self::InvalidRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Upstream body for diagnostics, parsed as JSON when possible.
    pub fn details(&self) -> Value {
        match self {
            Self::Authentication { body, .. } | Self::EmbedToken { body, .. } => {
                serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone()))
            }
            _ => Value::Null,
        }
    }
}

/// Errors returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required request parameter is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// Token issuance failed; rendered as an opaque `500`.
    #[error("error generating embed token: {0}")]
    TokenIssuance(#[source] FlowError),

    /// Token issuance failed; the upstream status and body are propagated.
    #[error(transparent)]
    Upstream(FlowError),

    /// The static report target is not configured.
    #[error("report details are not configured: {0}")]
    NotConfigured(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            Self::TokenIssuance(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal Server Error" }),
            ),
            Self::Upstream(err) => {
                let status = err.status();
                let body = UpstreamErrorBody {
                    error: err.to_string(),
                    status: status.as_u16(),
                    details: err.details(),
                };
                (status, json!(body))
            }
            Self::NotConfigured(_) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = UpstreamErrorBody {
                    error: self.to_string(),
                    status: status.as_u16(),
                    details: Value::Null,
                };
                (status, json!(body))
            }
        };

        tracing::error!(%status, error = %self, "request failed");
        (status, Json(body)).into_response()
    }
}

/// Startup configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is unset or blank.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
