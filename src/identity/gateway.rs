//! Session-scoped front door to the identity provider.
//!
//! [`IdentityGateway`] keeps two channels per client session. A
//! [`tokio::sync::watch`] channel holds the latest [`AuthState`] for
//! consumers that only care about the current value (the WebSocket push).
//! A [`tokio::sync::broadcast`] channel queues every change in order, so
//! listeners registered with [`IdentityGateway::on_auth_state_change`] see
//! each sign-in and sign-out even when they follow each other closely.
//! There is no polling.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, watch};
use tokio::task::JoinHandle;

use super::{FederatedFlow, IdentityError, IdentityProvider};
use crate::domain::{AuthState, Identity, SessionId};
use crate::error::AppError;

/// Queued auth-state changes per session before slow listeners lag.
const CHANGE_CAPACITY: usize = 64;

/// Handle returned by [`IdentityGateway::on_auth_state_change`].
///
/// The listener stays registered until the handle is dropped or
/// [`AuthSubscription::unsubscribe`] is called.
#[derive(Debug)]
pub struct AuthSubscription {
    task: JoinHandle<()>,
}

impl AuthSubscription {
    /// Stops delivering notifications.
    pub fn unsubscribe(self) {
        self.task.abort();
    }

    /// Whether the listener is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Ordered stream of auth-state changes of one session.
///
/// Obtained from [`IdentityGateway::subscribe`]. Yields every change made
/// after the subscription, oldest first.
#[derive(Debug)]
pub struct AuthChanges {
    session_id: SessionId,
    receiver: broadcast::Receiver<AuthState>,
}

impl AuthChanges {
    /// Waits for the next change. `None` once the session is closed and
    /// every queued change has been delivered.
    pub async fn next(&mut self) -> Option<AuthState> {
        loop {
            match self.receiver.recv().await {
                Ok(state) => return Some(state),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(session_id = %self.session_id, skipped, "auth listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[derive(Debug)]
struct SessionChannels {
    latest: watch::Sender<AuthState>,
    changes: broadcast::Sender<AuthState>,
}

impl SessionChannels {
    fn new() -> Self {
        let (latest, _) = watch::channel(AuthState::SignedOut);
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self { latest, changes }
    }

    fn current(&self) -> AuthState {
        self.latest.borrow().clone()
    }

    /// Stores `next` and queues it for listeners. No-op when unchanged.
    fn publish(&self, next: AuthState) -> bool {
        let changed = self.latest.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next.clone();
                true
            }
        });
        if changed {
            // No receivers is fine: nobody is listening yet.
            let _ = self.changes.send(next);
        }
        changed
    }
}

/// Sign-in, sign-up, federated sign-in and sign-out per client session,
/// plus the auth-state notification contract.
///
/// State changes take the session map's write lock, so a subscriber that
/// reads the current state and subscribes under the read lock never
/// misses or repeats a change.
#[derive(Debug)]
pub struct IdentityGateway {
    provider: Arc<dyn IdentityProvider>,
    sessions: RwLock<HashMap<SessionId, SessionChannels>>,
}

impl IdentityGateway {
    /// Creates a gateway in front of `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Opens a new, signed-out client session.
    pub async fn open_session(&self) -> SessionId {
        let session_id = SessionId::new();
        self.sessions
            .write()
            .await
            .insert(session_id, SessionChannels::new());
        tracing::debug!(%session_id, "session opened");
        session_id
    }

    /// Closes a session. Listeners see a final signed-out notification
    /// when the session was signed in, then their streams end.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SessionNotFound`] if the session is unknown.
    pub async fn close_session(&self, session_id: SessionId) -> Result<(), AppError> {
        let channels = self
            .sessions
            .write()
            .await
            .remove(&session_id)
            .ok_or(AppError::SessionNotFound(session_id))?;
        channels.publish(AuthState::SignedOut);
        tracing::debug!(%session_id, "session closed");
        Ok(())
    }

    /// Number of open sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Current auth state of a session.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SessionNotFound`] if the session is unknown.
    pub async fn auth_state(&self, session_id: SessionId) -> Result<AuthState, AppError> {
        let sessions = self.sessions.read().await;
        let channels = sessions
            .get(&session_id)
            .ok_or(AppError::SessionNotFound(session_id))?;
        Ok(channels.current())
    }

    /// Signed-in identity of a session, if any.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SessionNotFound`] if the session is unknown.
    pub async fn current_identity(
        &self,
        session_id: SessionId,
    ) -> Result<Option<Identity>, AppError> {
        Ok(self.auth_state(session_id).await?.into_identity())
    }

    /// Signs a session in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SessionNotFound`] for an unknown session, or
    /// [`AppError::Identity`] carrying the provider's rejection.
    pub async fn sign_in(
        &self,
        session_id: SessionId,
        email: &str,
        password: &str,
    ) -> Result<Identity, AppError> {
        self.ensure_session(session_id).await?;
        let result = self.provider.sign_in(email, password).await;
        self.complete_sign_in(session_id, result).await
    }

    /// Creates an account and signs the session in with it.
    ///
    /// # Errors
    ///
    /// Same as [`IdentityGateway::sign_in`].
    pub async fn sign_up(
        &self,
        session_id: SessionId,
        email: &str,
        password: &str,
    ) -> Result<Identity, AppError> {
        self.ensure_session(session_id).await?;
        let result = self.provider.sign_up(email, password).await;
        self.complete_sign_in(session_id, result).await
    }

    /// Runs a federated flow and signs the session in with its result.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Identity`] with [`IdentityError::Cancelled`]
    /// when the user abandons the flow, or the provider's rejection.
    pub async fn sign_in_with_federated_provider(
        &self,
        session_id: SessionId,
        flow: &dyn FederatedFlow,
    ) -> Result<Identity, AppError> {
        self.ensure_session(session_id).await?;
        let result = match flow.authorize().await {
            Ok(credential) => self.provider.sign_in_federated(&credential).await,
            Err(err) => Err(err),
        };
        self.complete_sign_in(session_id, result).await
    }

    /// Signs the session out. Signing out a signed-out session is a no-op
    /// and does not notify listeners.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SessionNotFound`] for an unknown session, or
    /// [`AppError::Identity`] if the provider fails to revoke.
    pub async fn sign_out(&self, session_id: SessionId) -> Result<(), AppError> {
        if let Some(identity) = self.current_identity(session_id).await? {
            self.provider.sign_out(&identity).await?;
            tracing::info!(%session_id, user_id = %identity.user_id, "signed out");
        }
        let sessions = self.sessions.write().await;
        if let Some(channels) = sessions.get(&session_id) {
            channels.publish(AuthState::SignedOut);
        }
        Ok(())
    }

    /// Returns a receiver holding the latest auth state of the session.
    /// The current value is marked unseen. Intermediate states may be
    /// skipped; use [`IdentityGateway::subscribe`] to see every change.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SessionNotFound`] if the session is unknown.
    pub async fn watch(
        &self,
        session_id: SessionId,
    ) -> Result<watch::Receiver<AuthState>, AppError> {
        let sessions = self.sessions.read().await;
        let channels = sessions
            .get(&session_id)
            .ok_or(AppError::SessionNotFound(session_id))?;
        let mut receiver = channels.latest.subscribe();
        receiver.mark_changed();
        Ok(receiver)
    }

    /// Returns the current auth state together with the ordered stream of
    /// every later change.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SessionNotFound`] if the session is unknown.
    pub async fn subscribe(
        &self,
        session_id: SessionId,
    ) -> Result<(AuthState, AuthChanges), AppError> {
        let sessions = self.sessions.read().await;
        let channels = sessions
            .get(&session_id)
            .ok_or(AppError::SessionNotFound(session_id))?;
        let changes = AuthChanges {
            session_id,
            receiver: channels.changes.subscribe(),
        };
        Ok((channels.current(), changes))
    }

    /// Registers `callback` for auth-state changes of the session.
    ///
    /// The callback runs once before this returns, with the current
    /// identity (or `None`), and then once per sign-in and sign-out, in
    /// order. Delivery stops when the returned handle is dropped or the
    /// session is closed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SessionNotFound`] if the session is unknown.
    pub async fn on_auth_state_change<F>(
        &self,
        session_id: SessionId,
        callback: F,
    ) -> Result<AuthSubscription, AppError>
    where
        F: Fn(Option<Identity>) + Send + Sync + 'static,
    {
        let (current, mut changes) = self.subscribe(session_id).await?;
        callback(current.into_identity());

        let task = tokio::spawn(async move {
            while let Some(state) = changes.next().await {
                callback(state.into_identity());
            }
        });
        Ok(AuthSubscription { task })
    }

    async fn ensure_session(&self, session_id: SessionId) -> Result<(), AppError> {
        if self.sessions.read().await.contains_key(&session_id) {
            Ok(())
        } else {
            Err(AppError::SessionNotFound(session_id))
        }
    }

    async fn complete_sign_in(
        &self,
        session_id: SessionId,
        result: Result<Identity, IdentityError>,
    ) -> Result<Identity, AppError> {
        let identity = match result {
            Ok(identity) => identity,
            Err(err) => {
                tracing::warn!(%session_id, code = ?err.code(), error = %err, "sign-in rejected");
                return Err(err.into());
            }
        };

        let sessions = self.sessions.write().await;
        let channels = sessions
            .get(&session_id)
            .ok_or(AppError::SessionNotFound(session_id))?;
        channels.publish(AuthState::SignedIn {
            identity: identity.clone(),
        });
        tracing::info!(%session_id, user_id = %identity.user_id, method = ?identity.method, "signed in");
        Ok(identity)
    }
}
