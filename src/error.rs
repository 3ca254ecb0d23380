//! Error types and handling for the skycast service

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Main error type for the skycast service
///
/// Each variant maps onto exactly one HTTP status returned to callers, so
/// orchestrators can fail with a variant and let the response layer do the
/// rest. Upstream provider statuses (401/404/429) are carried through
/// unchanged.
#[derive(Error, Debug)]
pub enum SkycastError {
    /// Missing or malformed caller input, rejected before any upstream call
    #[error("{message}")]
    Validation { message: String },

    /// Upstream lookup returned no match for syntactically valid input
    #[error("{message}")]
    NotFound { message: String },

    /// Provider rejected our credential (HTTP 401)
    #[error("Invalid API key")]
    Unauthorized,

    /// Provider rate limit hit (HTTP 429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Provider returned a payload that failed validation
    #[error("{message}")]
    UpstreamInvalid { message: String },

    /// Transport-level failure contacting a provider (timeout, connect error)
    #[error("Network error: {message}")]
    Network { message: String },

    /// Catch-all for any other failure during processing
    #[error("Unexpected error: {message}")]
    Unexpected { message: String },
}

impl SkycastError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new invalid-upstream-payload error
    pub fn upstream_invalid<S: Into<String>>(message: S) -> Self {
        Self::UpstreamInvalid {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new unexpected error
    pub fn unexpected<S: Into<String>>(message: S) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// HTTP status this error surfaces as
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            SkycastError::Validation { .. } => StatusCode::BAD_REQUEST,
            SkycastError::NotFound { .. } => StatusCode::NOT_FOUND,
            SkycastError::Unauthorized => StatusCode::UNAUTHORIZED,
            SkycastError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            SkycastError::UpstreamInvalid { .. }
            | SkycastError::Network { .. }
            | SkycastError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SkycastError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self}");
        } else {
            tracing::warn!("{self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let validation_err = SkycastError::validation("missing location");
        assert!(matches!(validation_err, SkycastError::Validation { .. }));

        let network_err = SkycastError::network("connection refused");
        assert!(matches!(network_err, SkycastError::Network { .. }));

        let upstream_err = SkycastError::upstream_invalid("missing wind section");
        assert!(matches!(upstream_err, SkycastError::UpstreamInvalid { .. }));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            SkycastError::validation("x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(SkycastError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            SkycastError::Unauthorized.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            SkycastError::RateLimited.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            SkycastError::upstream_invalid("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            SkycastError::network("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            SkycastError::unexpected("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_messages() {
        let err = SkycastError::validation("Location parameter required");
        assert_eq!(err.to_string(), "Location parameter required");

        let err = SkycastError::network("timed out");
        assert_eq!(err.to_string(), "Network error: timed out");

        assert_eq!(SkycastError::Unauthorized.to_string(), "Invalid API key");
        assert_eq!(SkycastError::RateLimited.to_string(), "Rate limit exceeded");
    }
}
