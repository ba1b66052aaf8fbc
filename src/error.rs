//! Application error types with HTTP status code mapping.
//!
//! [`AppError`] is the central error type. Each variant maps to a numeric
//! code, an HTTP status and a structured JSON error response. Messages
//! from the identity provider and the store are carried through verbatim
//! so they can be shown to the user as-is.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{EventId, SessionId};
use crate::identity::IdentityError;
use crate::store::StoreError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "Please select a ticket category!",
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
    /// Numeric error code.
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
/// | Range     | Category               | HTTP Status                  |
/// |-----------|------------------------|------------------------------|
/// | 1000–1999 | Validation / auth      | 400 Bad Request / 401        |
/// | 2000–2999 | State / Not Found      | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server / upstream      | 500 / 502                    |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Input failed a local check before any store call.
    #[error("{0}")]
    Validation(String),

    /// The action needs a signed-in user.
    #[error("{0}")]
    Unauthenticated(String),

    /// The identity provider rejected or could not complete the request.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Event with the given ID was not found.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// Session with the given ID is unknown or closed.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The user already holds a registration for this event.
    #[error("already registered for event {0}")]
    AlreadyRegistered(EventId),

    /// Store failure, message passed through from the backend.
    #[error("{0}")]
    Store(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a validation failure.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for an unauthenticated action.
    #[must_use]
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::Unauthenticated(_) => 1002,
            Self::Identity(_) => 1003,
            Self::EventNotFound(_) => 2001,
            Self::SessionNotFound(_) => 2002,
            Self::AlreadyRegistered(_) => 2003,
            Self::Internal(_) => 3000,
            Self::Store(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Identity(IdentityError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            Self::Identity(_) => StatusCode::UNAUTHORIZED,
            Self::EventNotFound(_) | Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyRegistered(_) => StatusCode::CONFLICT,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EventNotFound(id) => Self::EventNotFound(id),
            StoreError::DuplicateRegistration(id) => Self::AlreadyRegistered(id),
            StoreError::Backend(message) => Self::Store(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = match &self {
            Self::Identity(err) => err.code().map(str::to_string),
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
