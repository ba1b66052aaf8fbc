//! Session and sign-in DTOs.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{AuthState, Identity, SessionId};
use crate::flows::Route;
use crate::identity::FederatedCredential;

/// A session and its auth state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    /// Session id; also the bearer token for event endpoints.
    pub session_id: SessionId,
    /// Current auth state.
    pub auth: AuthState,
}

/// Email and password.
#[derive(Clone, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    /// Account email.
    #[serde(default)]
    pub email: String,
    /// Account password.
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Outcome of a browser-side federated popup.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FederatedRequest {
    /// The provider's credential, or `null` if the user closed the popup.
    #[serde(default)]
    pub credential: Option<FederatedCredential>,
}

/// A successful sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignInResponse {
    /// Session now signed in.
    pub session_id: SessionId,
    /// Signed-in identity.
    pub identity: Identity,
    /// Where the client should navigate.
    pub route: Route,
}

/// Query string of the route guard endpoint.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct RouteQuery {
    /// Requested client path, e.g. `/my-events`.
    pub path: String,
}

/// Route guard decision.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RouteResponse {
    /// The path that was asked for.
    pub requested: String,
    /// Where the session lands.
    pub route: Route,
    /// Canonical path of `route`.
    pub path: String,
}
