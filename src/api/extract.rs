//! Bearer-session extractors.
//!
//! Event endpoints authenticate with `Authorization: Bearer <session id>`.
//! [`MaybeIdentity`] tolerates a missing header; [`Authenticated`]
//! requires a signed-in session.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::domain::{Identity, SessionId};
use crate::error::AppError;

/// Session id taken from the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BearerSession(pub SessionId);

impl BearerSession {
    /// Reads the bearer session from request headers. `Ok(None)` when the
    /// header is absent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthenticated`] for a header that is not
    /// `Bearer <uuid>`.
    pub fn from_parts(parts: &Parts) -> Result<Option<Self>, AppError> {
        let Some(value) = parts.headers.get(AUTHORIZATION) else {
            return Ok(None);
        };
        let header = value
            .to_str()
            .map_err(|_| AppError::unauthenticated("Invalid authorization header"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                AppError::unauthenticated("Invalid authorization format. Expected 'Bearer <session id>'")
            })?
            .trim();
        let session = token
            .parse::<SessionId>()
            .map_err(|_| AppError::unauthenticated("Invalid session token"))?;
        Ok(Some(Self(session)))
    }
}

impl FromRequestParts<AppState> for BearerSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts)?
            .ok_or_else(|| AppError::unauthenticated("Missing authorization header"))
    }
}

/// The caller's identity when a signed-in bearer session is presented,
/// `None` for anonymous or signed-out callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaybeIdentity(pub Option<Identity>);

impl FromRequestParts<AppState> for MaybeIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(BearerSession(session)) = BearerSession::from_parts(parts)? else {
            return Ok(Self(None));
        };
        let identity = resolve(state, session).await?;
        Ok(Self(identity))
    }
}

/// A signed-in caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    /// Bearer session.
    pub session: SessionId,
    /// Its signed-in identity.
    pub identity: Identity,
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let BearerSession(session) = BearerSession::from_request_parts(parts, state).await?;
        let identity = resolve(state, session)
            .await?
            .ok_or_else(|| AppError::unauthenticated("You must be logged in!"))?;
        Ok(Self { session, identity })
    }
}

async fn resolve(state: &AppState, session: SessionId) -> Result<Option<Identity>, AppError> {
    match state.gateway.current_identity(session).await {
        Err(AppError::SessionNotFound(_)) => Err(AppError::unauthenticated("Unknown session")),
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/events");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let Ok(request) = builder.body(()) else {
            panic!("request should build");
        };
        request.into_parts().0
    }

    #[test]
    fn absent_header_is_anonymous() {
        let Ok(None) = BearerSession::from_parts(&parts_with(None)) else {
            panic!("missing header should be anonymous");
        };
    }

    #[test]
    fn bearer_uuid_parses() {
        let session = SessionId::new();
        let header = format!("Bearer {session}");
        let Ok(Some(BearerSession(parsed))) = BearerSession::from_parts(&parts_with(Some(&header)))
        else {
            panic!("bearer session should parse");
        };
        assert_eq!(parsed, session);
    }

    #[test]
    fn malformed_headers_are_rejected() {
        for header in ["Basic abc", "Bearer not-a-uuid", "Bearer "] {
            let result = BearerSession::from_parts(&parts_with(Some(header)));
            assert!(matches!(result, Err(AppError::Unauthenticated(_))), "{header}");
        }
    }
}
