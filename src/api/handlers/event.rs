//! Event handlers: create, list/search, register, reviews.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateEventResponse, EventListResponse, EventQuery, EventView, RegisterRequest,
    RegistrationResponse, ReviewListResponse, ReviewRequest, ReviewResponse,
};
use crate::api::extract::MaybeIdentity;
use crate::app_state::AppState;
use crate::domain::{EventId, display_price};
use crate::error::{AppError, ErrorResponse};
use crate::service::{EVENT_CREATED, EventDraft, REGISTERED, REVIEW_SUBMITTED};

/// `POST /events` — Create an event.
///
/// # Errors
///
/// Returns [`AppError::Unauthenticated`] without a signed-in session or
/// [`AppError::Validation`] naming the first empty required field.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Create an event",
    description = "Writes one event owned by the caller with its registration count at zero. Seat rows are stored as typed.",
    request_body = EventDraft,
    responses(
        (status = 201, description = "Event created", body = CreateEventResponse),
        (status = 400, description = "Required field empty", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn create_event(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Json(draft): Json<EventDraft>,
) -> Result<impl IntoResponse, AppError> {
    let event_id = state.events.create_event(identity.as_ref(), draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateEventResponse {
            event_id,
            message: EVENT_CREATED.to_string(),
        }),
    ))
}

/// `GET /events?q=` — List and search events.
///
/// # Errors
///
/// Returns the store's failure.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "List events",
    description = "Returns every event whose name contains `q` (case-insensitive), oldest first. With a signed-in bearer session each event carries `already_registered`.",
    params(EventQuery),
    responses(
        (status = 200, description = "Event list", body = EventListResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Query(query): Query<EventQuery>,
) -> Result<impl IntoResponse, AppError> {
    let events = state
        .events
        .search_events(query.q.as_deref().unwrap_or_default())
        .await?;
    let registered = match &identity {
        Some(identity) => Some(state.events.registered_event_ids(&identity.user_id).await?),
        None => None,
    };

    let events: Vec<EventView> = events
        .into_iter()
        .map(|event| EventView {
            already_registered: registered.as_ref().map(|ids| ids.contains(&event.id)),
            event,
        })
        .collect();
    let total = events.len();
    Ok(Json(EventListResponse { events, total }))
}

/// `POST /events/{id}/registrations` — Register for an event.
///
/// # Errors
///
/// Returns [`AppError::Unauthenticated`], [`AppError::Validation`] for an
/// empty category, [`AppError::EventNotFound`], or
/// [`AppError::AlreadyRegistered`] under the one-per-user policy.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/registrations",
    tag = "Registrations",
    summary = "Register for an event",
    description = "Increments the event's registration count and writes a registration carrying the price of the first seat tier with the chosen name.",
    params(("id" = String, Path, description = "Event UUID")),
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = RegistrationResponse),
        (status = 400, description = "No category selected", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Already registered", body = ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn register(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(event_id): Path<EventId>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let registration = state
        .events
        .register_by_id(identity.as_ref(), event_id, &req.ticket_category)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            displayed_price: display_price(registration.price.as_deref()),
            registration,
            message: REGISTERED.to_string(),
        }),
    ))
}

/// `GET /events/{id}/reviews` — Reviews of an event.
///
/// # Errors
///
/// Returns the store's failure.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/reviews",
    tag = "Reviews",
    summary = "List reviews",
    params(("id" = String, Path, description = "Event UUID")),
    responses(
        (status = 200, description = "Reviews, oldest first", body = ReviewListResponse),
    )
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> Result<impl IntoResponse, AppError> {
    let reviews = state.events.reviews_for(event_id).await?;
    Ok(Json(ReviewListResponse { event_id, reviews }))
}

/// `POST /events/{id}/reviews` — Review an event.
///
/// # Errors
///
/// Returns [`AppError::Unauthenticated`], [`AppError::Validation`] for
/// empty text, or [`AppError::EventNotFound`].
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/reviews",
    tag = "Reviews",
    summary = "Post a review",
    params(("id" = String, Path, description = "Event UUID")),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review written", body = ReviewResponse),
        (status = 400, description = "Empty review", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    ),
    security(("session" = []))
)]
pub async fn post_review(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(event_id): Path<EventId>,
    Json(req): Json<ReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.events.get_event(event_id).await?;
    let review = state
        .events
        .post_review(identity.as_ref(), event_id, &req.review)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ReviewResponse {
            review,
            message: REVIEW_SUBMITTED.to_string(),
        }),
    ))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event).get(list_events))
        .route("/events/{id}/registrations", post(register))
        .route("/events/{id}/reviews", get(list_reviews).post(post_review))
}
