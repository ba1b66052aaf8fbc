//! WebSocket auth-state push against a live in-memory server.

#![allow(clippy::panic)]

mod common;

use std::time::Duration;

use common::{TestServer, spawn_app};
use event_desk::store::RegistrationPolicy;
use futures_util::{SinkExt, StreamExt};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn open_session(server: &TestServer) -> String {
    let (status, body) = server.post("/api/v1/sessions", None, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    let Some(id) = body["session_id"].as_str().map(str::to_string) else {
        panic!("session id missing: {body}");
    };
    id
}

async fn connect(server: &TestServer, session: &str) -> Socket {
    let url = format!("ws://{}/ws?session={session}", server.addr);
    let Ok((socket, _)) = connect_async(url).await else {
        panic!("ws connect failed");
    };
    socket
}

/// Next text frame as JSON, skipping pings.
async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let Ok(Some(frame)) = tokio::time::timeout(Duration::from_secs(5), socket.next()).await
        else {
            panic!("no frame within timeout");
        };
        match frame {
            Ok(Message::Text(text)) => {
                let Ok(value) = serde_json::from_str::<Value>(&text) else {
                    panic!("frame is not JSON: {text}");
                };
                return value;
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

#[tokio::test]
async fn pushes_current_state_then_sign_in() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let session = open_session(&server).await;
    let mut socket = connect(&server, &session).await;

    let first = next_json(&mut socket).await;
    assert_eq!(first["type"], "event");
    assert_eq!(first["payload"]["session_id"], session.as_str());
    assert_eq!(first["payload"]["auth"]["status"], "signed_out");

    let (status, _) = server
        .post(
            &format!("/api/v1/sessions/{session}/sign-up"),
            None,
            json!({ "email": "ws@example.com", "password": "secret-pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let pushed = next_json(&mut socket).await;
    assert_eq!(pushed["type"], "event");
    assert_eq!(pushed["payload"]["auth"]["status"], "signed_in");
    assert_eq!(
        pushed["payload"]["auth"]["identity"]["email"],
        "ws@example.com"
    );
}

#[tokio::test]
async fn commands_answer_with_request_id() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let session = server.signed_up("cmd@example.com").await;
    let mut socket = connect(&server, &session).await;

    let first = next_json(&mut socket).await;
    assert_eq!(first["payload"]["auth"]["status"], "signed_in");

    let request = json!({
        "id": "q1",
        "type": "command",
        "timestamp": "2025-01-01T00:00:00Z",
        "payload": { "command": "get_state" },
    });
    let sent = socket.send(Message::text(request.to_string())).await;
    assert!(sent.is_ok());
    let reply = next_json(&mut socket).await;
    assert_eq!(reply["id"], "q1");
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["payload"]["auth"]["status"], "signed_in");

    let request = json!({
        "id": "q2",
        "type": "command",
        "timestamp": "2025-01-01T00:00:00Z",
        "payload": { "command": "sign_out" },
    });
    let sent = socket.send(Message::text(request.to_string())).await;
    assert!(sent.is_ok());

    // The push and the reply race; collect both.
    let mut seen = Vec::new();
    for _ in 0..2 {
        seen.push(next_json(&mut socket).await);
    }
    assert!(
        seen.iter()
            .any(|m| m["id"] == "q2" && m["payload"]["signed_out"] == true)
    );
    assert!(
        seen.iter()
            .any(|m| m["type"] == "event" && m["payload"]["auth"]["status"] == "signed_out")
    );

    let (_, body) = server
        .get(&format!("/api/v1/sessions/{session}"), None)
        .await;
    assert_eq!(body["auth"]["status"], "signed_out");
}

#[tokio::test]
async fn malformed_frames_get_error_replies() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let session = open_session(&server).await;
    let mut socket = connect(&server, &session).await;
    let _ = next_json(&mut socket).await;

    let sent = socket.send(Message::text("{not json")).await;
    assert!(sent.is_ok());
    let reply = next_json(&mut socket).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["payload"]["code"], 400);
}

#[tokio::test]
async fn closing_the_session_closes_the_socket() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let session = open_session(&server).await;
    let mut socket = connect(&server, &session).await;
    let _ = next_json(&mut socket).await;

    let (status, _) = server
        .call(
            reqwest::Method::DELETE,
            &format!("/api/v1/sessions/{session}"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let Ok(frame) = tokio::time::timeout(Duration::from_secs(5), socket.next()).await else {
        panic!("socket stayed open");
    };
    assert!(matches!(frame, Some(Ok(Message::Close(_))) | None));
}

#[tokio::test]
async fn unknown_session_is_refused_before_upgrade() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let url = format!("ws://{}/ws?session={}", server.addr, uuid::Uuid::new_v4());
    assert!(connect_async(url).await.is_err());
}
