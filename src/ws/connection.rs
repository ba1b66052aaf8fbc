//! WebSocket connection loop.
//!
//! Pushes the session's auth state once on connect and again on every
//! change, and answers client commands.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;

use super::messages::{AuthStatePayload, WsCommand, WsMessage, WsMessageType};
use crate::domain::{AuthState, SessionId};
use crate::identity::IdentityGateway;

/// Runs the read/write loop for a single WebSocket connection.
///
/// `auth_rx` must have its current value marked unseen so the first
/// state is pushed immediately. The loop ends when the client leaves or
/// the session is closed.
pub async fn run_connection(
    socket: WebSocket,
    session_id: SessionId,
    mut auth_rx: watch::Receiver<AuthState>,
    gateway: Arc<IdentityGateway>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, session_id, &gateway).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            changed = auth_rx.changed() => {
                if changed.is_err() {
                    tracing::debug!(%session_id, "session closed; ending ws connection");
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
                let state = auth_rx.borrow_and_update().clone();
                let Some(json) = state_message(session_id, state, WsMessageType::Event, None) else {
                    continue;
                };
                if ws_tx.send(Message::text(json)).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!(%session_id, "ws connection closed");
}

fn state_message(
    session_id: SessionId,
    auth: AuthState,
    msg_type: WsMessageType,
    reply_to: Option<String>,
) -> Option<String> {
    let payload = serde_json::to_value(AuthStatePayload { session_id, auth }).ok()?;
    let msg = match reply_to {
        Some(id) => WsMessage::reply(id, msg_type, payload),
        None => WsMessage::server(msg_type, payload),
    };
    serde_json::to_string(&msg).ok()
}

/// Handles a text message from the client, returning an optional JSON
/// response.
async fn handle_text_message(
    text: &str,
    session_id: SessionId,
    gateway: &IdentityGateway,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error(String::new(), 400, "malformed JSON")).ok();
    };

    let command = match msg.msg_type {
        WsMessageType::Command => serde_json::from_value::<WsCommand>(msg.payload).ok(),
        _ => None,
    };

    match command {
        Some(WsCommand::GetState) => match gateway.auth_state(session_id).await {
            Ok(state) => state_message(session_id, state, WsMessageType::Response, Some(msg.id)),
            Err(err) => serde_json::to_string(&WsMessage::error(msg.id, 404, &err.to_string())).ok(),
        },
        Some(WsCommand::SignOut) => {
            let payload = match gateway.sign_out(session_id).await {
                Ok(()) => WsMessage::reply(
                    msg.id,
                    WsMessageType::Response,
                    serde_json::json!({ "signed_out": true }),
                ),
                Err(err) => WsMessage::error(msg.id, 500, &err.to_string()),
            };
            serde_json::to_string(&payload).ok()
        }
        None => serde_json::to_string(&WsMessage::error(msg.id, 404, "unknown command")).ok(),
    }
}
