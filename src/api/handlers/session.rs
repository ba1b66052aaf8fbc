//! Session handlers: open, inspect, close, sign in/up/out, route guard.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CredentialsRequest, FederatedRequest, RouteQuery, RouteResponse, SessionResponse,
    SignInResponse,
};
use crate::app_state::AppState;
use crate::domain::{AuthState, Identity, SessionId};
use crate::error::{AppError, ErrorResponse};
use crate::flows::{Route, guard};
use crate::identity::CompletedFlow;

/// `POST /sessions` — Open a signed-out session.
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "Sessions",
    summary = "Open a session",
    description = "Creates a signed-out client session. Its id is the bearer token for event endpoints and the key for the auth-state WebSocket.",
    responses(
        (status = 201, description = "Session opened", body = SessionResponse),
    )
)]
pub async fn open_session(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.gateway.open_session().await;
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            auth: AuthState::SignedOut,
        }),
    )
}

/// `GET /sessions/{id}` — Current auth state.
///
/// # Errors
///
/// Returns [`AppError::SessionNotFound`] for an unknown session.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    summary = "Get auth state",
    params(("id" = String, Path, description = "Session UUID")),
    responses(
        (status = 200, description = "Auth state", body = SessionResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, AppError> {
    let auth = state.gateway.auth_state(session_id).await?;
    Ok(Json(SessionResponse { session_id, auth }))
}

/// `DELETE /sessions/{id}` — Close a session.
///
/// # Errors
///
/// Returns [`AppError::SessionNotFound`] for an unknown session.
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    summary = "Close a session",
    description = "Notifies listeners that the session is signed out, then forgets it.",
    params(("id" = String, Path, description = "Session UUID")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    )
)]
pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, AppError> {
    state.gateway.close_session(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /sessions/{id}/sign-in` — Email and password sign-in.
///
/// # Errors
///
/// Returns the provider's rejection verbatim.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/sign-in",
    tag = "Sessions",
    summary = "Sign in",
    params(("id" = String, Path, description = "Session UUID")),
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 401, description = "Provider rejected the credentials", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let identity = state
        .gateway
        .sign_in(session_id, &req.email, &req.password)
        .await?;
    Ok(Json(signed_in(session_id, identity)))
}

/// `POST /sessions/{id}/sign-up` — Create an account and sign in.
///
/// # Errors
///
/// Returns the provider's rejection verbatim.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/sign-up",
    tag = "Sessions",
    summary = "Sign up",
    params(("id" = String, Path, description = "Session UUID")),
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = SignInResponse),
        (status = 401, description = "Provider rejected the sign-up", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let identity = state
        .gateway
        .sign_up(session_id, &req.email, &req.password)
        .await?;
    Ok((StatusCode::CREATED, Json(signed_in(session_id, identity))))
}

/// `POST /sessions/{id}/federated` — Complete a federated sign-in.
///
/// # Errors
///
/// Returns the cancellation or the provider's rejection.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/federated",
    tag = "Sessions",
    summary = "Federated sign-in",
    description = "Exchanges the credential produced by a browser-side provider popup. A null credential means the user closed the popup.",
    params(("id" = String, Path, description = "Session UUID")),
    request_body = FederatedRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 401, description = "Cancelled or rejected", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    )
)]
pub async fn sign_in_federated(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(req): Json<FederatedRequest>,
) -> Result<impl IntoResponse, AppError> {
    let flow = CompletedFlow(req.credential);
    let identity = state
        .gateway
        .sign_in_with_federated_provider(session_id, &flow)
        .await?;
    Ok(Json(signed_in(session_id, identity)))
}

/// `POST /sessions/{id}/sign-out` — Sign out.
///
/// # Errors
///
/// Returns [`AppError::SessionNotFound`] for an unknown session.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/sign-out",
    tag = "Sessions",
    summary = "Sign out",
    params(("id" = String, Path, description = "Session UUID")),
    responses(
        (status = 200, description = "Signed out", body = SessionResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    )
)]
pub async fn sign_out(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, AppError> {
    state.gateway.sign_out(session_id).await?;
    let auth = state.gateway.auth_state(session_id).await?;
    Ok(Json(SessionResponse { session_id, auth }))
}

/// `GET /sessions/{id}/route?path=` — Route guard.
///
/// # Errors
///
/// Returns [`AppError::Validation`] for an unknown path, or
/// [`AppError::SessionNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/route",
    tag = "Sessions",
    summary = "Resolve a client route",
    description = "Applies the route guard: signed-out sessions land on /login.",
    params(("id" = String, Path, description = "Session UUID"), RouteQuery),
    responses(
        (status = 200, description = "Route decision", body = RouteResponse),
        (status = 400, description = "Unknown path", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    )
)]
pub async fn resolve_route(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Query(query): Query<RouteQuery>,
) -> Result<impl IntoResponse, AppError> {
    let requested = Route::parse(&query.path)
        .ok_or_else(|| AppError::validation(format!("unknown route: {}", query.path)))?;
    let auth = state.gateway.auth_state(session_id).await?;
    let route = guard(requested, &auth);
    Ok(Json(RouteResponse {
        requested: query.path,
        route,
        path: route.as_path().to_string(),
    }))
}

fn signed_in(session_id: SessionId, identity: Identity) -> SignInResponse {
    SignInResponse {
        session_id,
        identity,
        route: Route::Dashboard,
    }
}

/// Session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/{id}", get(get_session).delete(close_session))
        .route("/sessions/{id}/sign-in", post(sign_in))
        .route("/sessions/{id}/sign-up", post(sign_up))
        .route("/sessions/{id}/federated", post(sign_in_federated))
        .route("/sessions/{id}/sign-out", post(sign_out))
        .route("/sessions/{id}/route", get(resolve_route))
}
