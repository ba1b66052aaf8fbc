//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::identity::IdentityGateway;
use crate::service::EventService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Sessions, sign-in and auth-state notifications.
    pub gateway: Arc<IdentityGateway>,
    /// Events, registrations and reviews.
    pub events: Arc<EventService>,
}
