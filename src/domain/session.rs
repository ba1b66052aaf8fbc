//! Authenticated identity and per-session auth state.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// How an identity proved itself to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Email and password.
    Password,
    /// Federated (provider popup) sign-in.
    Federated,
}

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    /// Stable provider-issued identifier.
    pub user_id: UserId,
    /// Email address, when the provider shares one.
    pub email: Option<String>,
    /// Credential type used for this sign-in.
    pub method: AuthMethod,
}

/// Auth state of one client session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuthState {
    /// Nobody is signed in.
    #[default]
    SignedOut,
    /// A user is signed in.
    SignedIn {
        /// The signed-in identity.
        identity: Identity,
    },
}

impl AuthState {
    /// Returns the signed-in identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedOut => None,
            Self::SignedIn { identity } => Some(identity),
        }
    }

    /// Consumes the state, returning the signed-in identity, if any.
    #[must_use]
    pub fn into_identity(self) -> Option<Identity> {
        match self {
            Self::SignedOut => None,
            Self::SignedIn { identity } => Some(identity),
        }
    }

    /// Whether a user is signed in.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }
}

impl From<Option<Identity>> for AuthState {
    fn from(identity: Option<Identity>) -> Self {
        identity.map_or(Self::SignedOut, |identity| Self::SignedIn { identity })
    }
}
