//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use utoipa::IntoParams;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::SessionId;
use crate::error::AppError;

/// Query string of `GET /ws`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct WsParams {
    /// Session whose auth state is pushed.
    pub session: SessionId,
}

/// `GET /ws?session=<id>` — Upgrade to a WebSocket that pushes the
/// session's auth state.
///
/// # Errors
///
/// Returns [`AppError::SessionNotFound`] before upgrading if the session
/// is unknown.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> Result<impl IntoResponse, AppError> {
    let auth_rx = state.gateway.watch(params.session).await?;
    let gateway = Arc::clone(&state.gateway);
    let session_id = params.session;

    Ok(ws.on_upgrade(move |socket| run_connection(socket, session_id, auth_rx, gateway)))
}
