//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AuthState, SessionId};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for pushes.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// A server-originated message with a fresh id.
    #[must_use]
    pub fn server(msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self::reply(uuid::Uuid::new_v4().to_string(), msg_type, payload)
    }

    /// A message answering request `id`.
    #[must_use]
    pub fn reply(id: String, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// An error message with a numeric code.
    #[must_use]
    pub fn error(id: String, code: u16, message: &str) -> Self {
        Self::reply(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client auth-state push.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send in a [`WsMessageType::Command`]
/// payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Re-send the current auth state.
    GetState,
    /// Sign the session out.
    SignOut,
}

/// Payload of an auth-state push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatePayload {
    /// Session the state belongs to.
    pub session_id: SessionId,
    /// The state.
    pub auth: AuthState,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn envelope_uses_type_key() {
        let msg = WsMessage::server(WsMessageType::Event, serde_json::json!({ "x": 1 }));
        let Ok(json) = serde_json::to_value(&msg) else {
            panic!("serialization failed");
        };
        assert_eq!(json.get("type"), Some(&serde_json::json!("event")));
        assert!(json.get("id").and_then(|v| v.as_str()).is_some_and(|s| !s.is_empty()));
    }

    #[test]
    fn commands_parse_from_tagged_payload() {
        let Ok(cmd) = serde_json::from_value::<WsCommand>(serde_json::json!({ "command": "sign_out" }))
        else {
            panic!("command should parse");
        };
        assert_eq!(cmd, WsCommand::SignOut);
        assert!(
            serde_json::from_value::<WsCommand>(serde_json::json!({ "command": "subscribe" })).is_err()
        );
    }
}
