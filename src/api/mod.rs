//! REST API layer: route handlers, DTOs, extractors, OpenAPI document and
//! router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root.

pub mod dto;
pub mod extract;
pub mod handlers;

use axum::Router;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// OpenAPI document for the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "event-desk",
        description = "Ticketed events, registrations and reviews."
    ),
    paths(
        handlers::session::open_session,
        handlers::session::get_session,
        handlers::session::close_session,
        handlers::session::sign_in,
        handlers::session::sign_up,
        handlers::session::sign_in_federated,
        handlers::session::sign_out,
        handlers::session::resolve_route,
        handlers::event::create_event,
        handlers::event::list_events,
        handlers::event::register,
        handlers::event::list_reviews,
        handlers::event::post_review,
        handlers::me::my_events,
        handlers::me::my_registrations,
        handlers::system::health_handler,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        crate::domain::Event,
        crate::domain::EventKind,
        crate::domain::SeatCategory,
        crate::domain::Registration,
        crate::domain::Review,
        crate::domain::Identity,
        crate::domain::AuthMethod,
        crate::domain::AuthState,
        crate::service::EventDraft,
        crate::service::OrganizerEvent,
        crate::flows::Route,
        crate::identity::FederatedCredential,
        dto::SessionResponse,
        dto::CredentialsRequest,
        dto::FederatedRequest,
        dto::SignInResponse,
        dto::RouteResponse,
        dto::CreateEventResponse,
        dto::EventView,
        dto::EventListResponse,
        dto::RegisterRequest,
        dto::RegistrationResponse,
        dto::RegistrationListResponse,
        dto::ReviewRequest,
        dto::ReviewResponse,
        dto::ReviewListResponse,
        dto::OrganizerResponse,
        handlers::system::HealthResponse,
    )),
    modifiers(&SessionSecurity),
    tags(
        (name = "Sessions", description = "Sign-in, sign-up, sign-out and the route guard"),
        (name = "Events", description = "Create, list and search events"),
        (name = "Registrations", description = "Ticket registrations"),
        (name = "Reviews", description = "Event reviews"),
        (name = "Organiser", description = "Organiser dashboard"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

/// Registers the bearer-session security scheme.
#[derive(Debug)]
struct SessionSecurity;

impl Modify for SessionSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("session UUID")
                        .build(),
                ),
            );
        }
    }
}
