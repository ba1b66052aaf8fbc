//! View flows as explicit state machines.
//!
//! Each flow receives a [`ViewContext`] at construction instead of
//! reading an ambient current user. The context names one client
//! session; the signed-in identity is read from the
//! [`IdentityGateway`] whenever a flow needs it.

pub mod browsing;
pub mod creation;
pub mod organizer;
pub mod session;

use std::sync::Arc;

use crate::domain::{Identity, SessionId};
use crate::error::AppError;
use crate::identity::IdentityGateway;
use crate::service::EventService;

pub use browsing::{BrowsingFlow, ReviewComposer, TicketSelection};
pub use creation::{EventCreationFlow, SubmissionState};
pub use organizer::OrganizerDashboard;
pub use session::{AuthMode, LoginForm, Route, SessionController, guard};

/// Everything a view needs: the gateway, the event service and the
/// session it acts for.
#[derive(Debug, Clone)]
pub struct ViewContext {
    gateway: Arc<IdentityGateway>,
    events: Arc<EventService>,
    session: SessionId,
}

impl ViewContext {
    /// Binds a context to an existing session.
    #[must_use]
    pub fn new(gateway: Arc<IdentityGateway>, events: Arc<EventService>, session: SessionId) -> Self {
        Self {
            gateway,
            events,
            session,
        }
    }

    /// Opens a fresh signed-out session and binds a context to it.
    pub async fn open(gateway: Arc<IdentityGateway>, events: Arc<EventService>) -> Self {
        let session = gateway.open_session().await;
        Self::new(gateway, events, session)
    }

    /// The session this context acts for.
    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// The identity gateway.
    #[must_use]
    pub fn gateway(&self) -> &Arc<IdentityGateway> {
        &self.gateway
    }

    /// The event service.
    #[must_use]
    pub fn events(&self) -> &Arc<EventService> {
        &self.events
    }

    /// The session's signed-in identity, if any.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SessionNotFound`] once the session is closed.
    pub async fn identity(&self) -> Result<Option<Identity>, AppError> {
        self.gateway.current_identity(self.session).await
    }
}
