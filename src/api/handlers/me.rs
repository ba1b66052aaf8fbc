//! Caller-scoped views: the organiser dashboard and own registrations.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{OrganizerResponse, RegistrationListResponse};
use crate::api::extract::Authenticated;
use crate::app_state::AppState;
use crate::error::{AppError, ErrorResponse};

/// `GET /my-events` — The caller's events with per-category tallies.
///
/// # Errors
///
/// Returns [`AppError::Unauthenticated`] without a signed-in session.
#[utoipa::path(
    get,
    path = "/api/v1/my-events",
    tag = "Organiser",
    summary = "Organiser dashboard",
    description = "Events created by the caller, each with its registrations counted by ticket category. Categories nobody picked are absent.",
    responses(
        (status = 200, description = "Organiser events", body = OrganizerResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn my_events(
    State(state): State<AppState>,
    caller: Authenticated,
) -> Result<impl IntoResponse, AppError> {
    let events = state
        .events
        .organizer_overview(&caller.identity.user_id)
        .await?;
    Ok(Json(OrganizerResponse { events }))
}

/// `GET /my-registrations` — The caller's registrations.
///
/// # Errors
///
/// Returns [`AppError::Unauthenticated`] without a signed-in session.
#[utoipa::path(
    get,
    path = "/api/v1/my-registrations",
    tag = "Registrations",
    summary = "Own registrations",
    responses(
        (status = 200, description = "Registrations", body = RegistrationListResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn my_registrations(
    State(state): State<AppState>,
    caller: Authenticated,
) -> Result<impl IntoResponse, AppError> {
    let mut registrations = state
        .events
        .registrations_of(&caller.identity.user_id)
        .await?;
    registrations.sort_by_key(|r| r.registered_at);
    Ok(Json(RegistrationListResponse { registrations }))
}

/// Caller-scoped routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/my-events", get(my_events))
        .route("/my-registrations", get(my_registrations))
}
