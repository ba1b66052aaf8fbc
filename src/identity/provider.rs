//! The seam to the external identity provider.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::IdentityError;
use crate::domain::Identity;

/// Credential produced by a completed federated sign-in flow.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FederatedCredential {
    /// Provider id, e.g. `google.com`.
    pub provider_id: String,
    /// Token issued by the federated provider.
    pub id_token: String,
    /// Email shared by the federated provider, if any.
    #[serde(default)]
    pub email: Option<String>,
}

impl fmt::Debug for FederatedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FederatedCredential")
            .field("provider_id", &self.provider_id)
            .field("id_token", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}

/// A provider-driven interactive sign-in flow (popup, redirect, device code).
///
/// Completes with the provider's credential, or with
/// [`IdentityError::Cancelled`] when the user abandons it.
#[async_trait]
pub trait FederatedFlow: Send + Sync {
    /// Runs the flow to completion.
    async fn authorize(&self) -> Result<FederatedCredential, IdentityError>;
}

/// Federated flow whose interactive part already ran in the browser.
///
/// The client posts the outcome; `None` means the user closed the popup.
#[derive(Debug, Clone)]
pub struct CompletedFlow(pub Option<FederatedCredential>);

#[async_trait]
impl FederatedFlow for CompletedFlow {
    async fn authorize(&self) -> Result<FederatedCredential, IdentityError> {
        match &self.0 {
            Some(credential) if !credential.id_token.is_empty() => Ok(credential.clone()),
            _ => Err(IdentityError::Cancelled),
        }
    }
}

/// Credential storage, password rules and federated token exchange.
///
/// Implementations own every side effect; the gateway only tracks which
/// session holds which identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync + fmt::Debug {
    /// Authenticates an existing email/password account.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    /// Creates an email/password account and signs it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    /// Exchanges a federated credential for an identity, creating the
    /// account on first use.
    async fn sign_in_federated(
        &self,
        credential: &FederatedCredential,
    ) -> Result<Identity, IdentityError>;

    /// Ends the provider side of a session. Stateless token providers
    /// have nothing to revoke.
    async fn sign_out(&self, _identity: &Identity) -> Result<(), IdentityError> {
        Ok(())
    }
}
