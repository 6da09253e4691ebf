//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1002,
///     "message": "metaverse must be STOPPED or ERROR to start",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                |
/// |-----------|---------------------|----------------------------|
/// | 1000–1999 | Validation          | 400 Bad Request            |
/// | 2000–2999 | State/Not Found     | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server              | 500 Internal Server Error  |
/// | 4000–4999 | Authentication      | 401 Unauthorized           |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("{0}")]
    Validation(String),

    /// A lifecycle action was requested from a state that does not allow it.
    /// The message names the state the entity must be in first.
    #[error("metaverse must be {required} to {action}")]
    InvalidTransition {
        /// The action that was attempted (`"start"`, `"stop"`, `"restart"`).
        action: &'static str,
        /// Human-readable description of the required prior state.
        required: &'static str,
    },

    /// A referenced entity does not exist (or is not visible to the caller).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Signup attempted with an email that is already registered.
    #[error("email is already registered")]
    EmailTaken,

    /// No usable bearer token in the `Authorization` header.
    #[error("missing or malformed authorization header")]
    MissingCredentials,

    /// The bearer token failed signature or claim validation.
    #[error("invalid token")]
    InvalidToken,

    /// The bearer token is past its expiry. Distinct code so clients can
    /// force a re-authentication flow instead of retrying.
    #[error("token expired")]
    TokenExpired,

    /// Login failed. Deliberately does not reveal which of email or
    /// password was wrong.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::InvalidTransition { .. } => 1002,
            Self::NotFound(_) => 2001,
            Self::EmailTaken => 2002,
            Self::Persistence(_) => 3001,
            Self::Internal(_) => 3000,
            Self::MissingCredentials => 4001,
            Self::InvalidToken => 4002,
            Self::TokenExpired => 4003,
            Self::InvalidCredentials => 4004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::MissingCredentials
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_names_required_state() {
        let err = GatewayError::InvalidTransition {
            action: "start",
            required: "STOPPED or ERROR",
        };
        assert_eq!(err.to_string(), "metaverse must be STOPPED or ERROR to start");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn auth_variants_share_status_but_not_code() {
        let expired = GatewayError::TokenExpired;
        let invalid = GatewayError::InvalidToken;
        assert_eq!(expired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(invalid.status_code(), StatusCode::UNAUTHORIZED);
        assert_ne!(expired.error_code(), invalid.error_code());
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = GatewayError::NotFound("metaverse");
        assert_eq!(err.to_string(), "metaverse not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), 2001);
    }
}
