//! Identity Toolkit REST provider.
//!
//! Talks to the hosted identity service over its `accounts:*` endpoints.
//! Error messages come back as upper-case codes (`EMAIL_NOT_FOUND`,
//! `WEAK_PASSWORD : Password should be at least 6 characters`) and are
//! surfaced untouched.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{FederatedCredential, IdentityError, IdentityProvider};
use crate::domain::{AuthMethod, Identity, UserId};

/// Connection settings for [`IdentityToolkitProvider`].
#[derive(Clone, PartialEq, Eq)]
pub struct ToolkitSettings {
    /// Base URL, e.g. `https://identitytoolkit.googleapis.com/v1`.
    pub endpoint: String,
    /// Project web API key.
    pub api_key: String,
    /// Redirect URI registered for federated sign-in.
    pub request_uri: String,
}

impl fmt::Debug for ToolkitSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolkitSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("request_uri", &self.request_uri)
            .finish()
    }
}

/// Identity provider backed by the Identity Toolkit REST API.
#[derive(Debug, Clone)]
pub struct IdentityToolkitProvider {
    client: reqwest::Client,
    settings: ToolkitSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_secure_token: bool,
    return_idp_credential: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: String,
}

impl IdentityToolkitProvider {
    /// Creates a provider with a fresh HTTP client.
    #[must_use]
    pub fn new(settings: ToolkitSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    fn url(&self, method: &str) -> String {
        format!(
            "{}/accounts:{method}?key={}",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.api_key
        )
    }

    async fn call<B: Serialize + Sync>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<AccountResponse, IdentityError> {
        let response = self
            .client
            .post(self.url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            return response
                .json::<AccountResponse>()
                .await
                .map_err(|e| IdentityError::Unavailable(e.to_string()));
        }

        let status = response.status();
        match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => Err(rejection(envelope.error.message)),
            Err(_) => Err(IdentityError::Unavailable(format!(
                "identity provider returned {status}"
            ))),
        }
    }
}

/// Splits `CODE : detail` into code and the full message.
fn rejection(message: String) -> IdentityError {
    let code = message
        .split_once(" : ")
        .map_or(message.as_str(), |(code, _)| code)
        .to_string();
    IdentityError::Rejected { code, message }
}

fn to_identity(account: AccountResponse, method: AuthMethod) -> Identity {
    Identity {
        user_id: UserId::new(account.local_id),
        email: account.email,
        method,
    }
}

#[async_trait]
impl IdentityProvider for IdentityToolkitProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let account = self.call("signInWithPassword", &body).await?;
        Ok(to_identity(account, AuthMethod::Password))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let account = self.call("signUp", &body).await?;
        Ok(to_identity(account, AuthMethod::Password))
    }

    async fn sign_in_federated(
        &self,
        credential: &FederatedCredential,
    ) -> Result<Identity, IdentityError> {
        // Provider tokens are URL-safe base64 segments; no escaping needed.
        let body = IdpRequest {
            post_body: format!(
                "id_token={}&providerId={}",
                credential.id_token, credential.provider_id
            ),
            request_uri: &self.settings.request_uri,
            return_secure_token: true,
            return_idp_credential: true,
        };
        let account = self.call("signInWithIdp", &body).await?;
        Ok(to_identity(account, AuthMethod::Federated))
    }
}
