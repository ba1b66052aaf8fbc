//! Shared helpers: an in-memory server on an ephemeral port and a thin
//! JSON client.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use event_desk::server::{build_app, in_memory_state};
use event_desk::store::RegistrationPolicy;
use reqwest::StatusCode;
use serde_json::{Value, json};

/// A running server.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Sends a request and returns the status with the JSON body
    /// (`Value::Null` for empty bodies).
    pub async fn call(
        &self,
        method: reqwest::Method,
        path: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let Ok(response) = request.send().await else {
            panic!("request to {path} failed");
        };
        let status = response.status();
        let Ok(text) = response.text().await else {
            panic!("body of {path} unreadable");
        };
        let value = if text.is_empty() {
            Value::Null
        } else {
            let Ok(value) = serde_json::from_str(&text) else {
                panic!("body of {path} is not JSON: {text}");
            };
            value
        };
        (status, value)
    }

    pub async fn get(&self, path: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        self.call(reqwest::Method::GET, path, bearer, None).await
    }

    pub async fn post(&self, path: &str, bearer: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(reqwest::Method::POST, path, bearer, Some(body)).await
    }

    /// Opens a session and signs up `email`; returns the session id.
    pub async fn signed_up(&self, email: &str) -> String {
        let (status, body) = self.post("/api/v1/sessions", None, json!({})).await;
        assert_eq!(status, StatusCode::CREATED);
        let Some(session) = body["session_id"].as_str().map(str::to_string) else {
            panic!("session id missing: {body}");
        };
        let (status, body) = self
            .post(
                &format!("/api/v1/sessions/{session}/sign-up"),
                None,
                json!({ "email": email, "password": "secret-pw" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        session
    }

    /// Creates an event as `bearer`; returns its id.
    pub async fn create_event(&self, bearer: &str, name: &str, seats: Value) -> String {
        let (status, body) = self
            .post(
                "/api/v1/events",
                Some(bearer),
                json!({
                    "name": name,
                    "description": "An event",
                    "kind": "In Person",
                    "audience": "Everyone",
                    "date": "2025-01-01",
                    "seats": seats,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let Some(id) = body["event_id"].as_str().map(str::to_string) else {
            panic!("event id missing: {body}");
        };
        id
    }
}

/// Binds the in-memory application on `127.0.0.1:0` and serves it in the
/// background.
pub async fn spawn_app(policy: RegistrationPolicy) -> TestServer {
    let app = build_app(in_memory_state(policy), Duration::from_secs(30));
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    TestServer {
        addr,
        client: reqwest::Client::new(),
    }
}
