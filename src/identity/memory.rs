//! In-process identity provider for development and tests.
//!
//! Passwords are hashed with Argon2id. Federated credentials are trusted
//! as presented: the `(provider_id, id_token)` pair is the account key, so
//! this backend must never face the public internet.

use std::collections::HashMap;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use rand::rngs::OsRng;
use tokio::sync::RwLock;

use super::{FederatedCredential, IdentityError, IdentityProvider};
use crate::domain::{AuthMethod, Identity, UserId};

/// Minimum password length accepted by [`InMemoryIdentityProvider::sign_up`].
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    user_id: UserId,
    email: String,
    password_hash: String,
}

/// Email/password and federated accounts held in memory.
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    federated: RwLock<HashMap<(String, String), Identity>>,
}

impl InMemoryIdentityProvider {
    /// Creates a provider with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of email/password accounts.
    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        check_email(email)?;
        if password.is_empty() {
            return Err(missing_password());
        }
        let account = self
            .accounts
            .read()
            .await
            .get(&normalize(email))
            .cloned()
            .ok_or_else(|| {
                IdentityError::rejected(
                    "auth/user-not-found",
                    "There is no user record corresponding to this identifier. The user may have been deleted.",
                )
            })?;

        if !verify_password(password.to_string(), account.password_hash).await? {
            return Err(IdentityError::rejected(
                "auth/wrong-password",
                "The password is invalid or the user does not have a password.",
            ));
        }

        Ok(Identity {
            user_id: account.user_id,
            email: Some(account.email),
            method: AuthMethod::Password,
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        check_email(email)?;
        if password.is_empty() {
            return Err(missing_password());
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::rejected(
                "auth/weak-password",
                "Password should be at least 6 characters",
            ));
        }

        let key = normalize(email);
        if self.accounts.read().await.contains_key(&key) {
            return Err(email_in_use());
        }

        let password_hash = hash_password(password.to_string()).await?;

        let mut accounts = self.accounts.write().await;
        // Re-check under the write lock; the hash above ran unlocked.
        if accounts.contains_key(&key) {
            return Err(email_in_use());
        }
        let account = Account {
            user_id: new_user_id(),
            email: email.trim().to_string(),
            password_hash,
        };
        let identity = Identity {
            user_id: account.user_id.clone(),
            email: Some(account.email.clone()),
            method: AuthMethod::Password,
        };
        accounts.insert(key, account);
        Ok(identity)
    }

    async fn sign_in_federated(
        &self,
        credential: &FederatedCredential,
    ) -> Result<Identity, IdentityError> {
        if credential.id_token.is_empty() {
            return Err(IdentityError::Cancelled);
        }
        let key = (credential.provider_id.clone(), credential.id_token.clone());
        let mut federated = self.federated.write().await;
        let identity = federated.entry(key).or_insert_with(|| Identity {
            user_id: new_user_id(),
            email: credential.email.clone(),
            method: AuthMethod::Federated,
        });
        Ok(identity.clone())
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn new_user_id() -> UserId {
    UserId::new(uuid::Uuid::new_v4().simple().to_string())
}

fn check_email(email: &str) -> Result<(), IdentityError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(IdentityError::rejected(
            "auth/invalid-email",
            "The email address is badly formatted.",
        ))
    }
}

/// Loose shape check: `local@domain.tld`, no whitespace.
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

fn missing_password() -> IdentityError {
    IdentityError::rejected("auth/missing-password", "A password is required.")
}

fn email_in_use() -> IdentityError {
    IdentityError::rejected(
        "auth/email-already-in-use",
        "The email address is already in use by another account.",
    )
}

/// Hashes on the blocking pool.
async fn hash_password(password: String) -> Result<String, IdentityError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| IdentityError::Unavailable(format!("failed to hash password: {e}")))
    })
    .await
    .map_err(|e| IdentityError::Unavailable(e.to_string()))?
}

async fn verify_password(password: String, hash: String) -> Result<bool, IdentityError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)
            .map_err(|e| IdentityError::Unavailable(format!("failed to parse password hash: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| IdentityError::Unavailable(e.to_string()))?
}
