//! End-to-end REST tests against the in-memory backends.

#![allow(clippy::panic)]

mod common;

use common::spawn_app;
use event_desk::store::RegistrationPolicy;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn launch_scenario() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let organiser = server.signed_up("org@example.com").await;
    let event_id = server
        .create_event(&organiser, "Launch", json!([{ "category": "GA", "price": "100" }]))
        .await;

    let (status, body) = server.get("/api/v1/events", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    let event = &body["events"][0];
    assert_eq!(event["id"], event_id.as_str());
    assert_eq!(event["registrations"], 0);
    assert_eq!(event["seats"], json!([{ "category": "GA", "price": "100" }]));
    assert!(event.get("already_registered").is_none());

    let attendee = server.signed_up("attendee@example.com").await;
    let (status, body) = server
        .post(
            &format!("/api/v1/events/{event_id}/registrations"),
            Some(&attendee),
            json!({ "ticket_category": "GA" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Registered successfully!");
    assert_eq!(body["displayed_price"], "100");
    assert_eq!(body["registration"]["event_id"], event_id.as_str());
    assert_eq!(body["registration"]["ticket_category"], "GA");
    assert_eq!(body["registration"]["price"], "100");

    let (_, body) = server.get("/api/v1/events", Some(&attendee)).await;
    assert_eq!(body["events"][0]["registrations"], 1);
    assert_eq!(body["events"][0]["already_registered"], true);

    let (_, body) = server.get("/api/v1/events", Some(&organiser)).await;
    assert_eq!(body["events"][0]["already_registered"], false);

    let (_, body) = server.get("/api/v1/my-registrations", Some(&attendee)).await;
    assert_eq!(body["registrations"].as_array().map(Vec::len), Some(1));

    let (status, body) = server.get("/api/v1/my-events", Some(&organiser)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"][0]["tallies"], json!({ "GA": 1 }));
}

#[tokio::test]
async fn registration_is_rejected_before_any_write() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let organiser = server.signed_up("org@example.com").await;
    let event_id = server
        .create_event(&organiser, "Launch", json!([{ "category": "GA", "price": "100" }]))
        .await;
    let path = format!("/api/v1/events/{event_id}/registrations");

    let (status, body) = server.post(&path, None, json!({ "ticket_category": "GA" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "You must be logged in to register!");

    let (status, body) = server.post(&path, Some(&organiser), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1001);
    assert_eq!(body["error"]["message"], "Please select a ticket category!");

    let (_, body) = server.get("/api/v1/events", None).await;
    assert_eq!(body["events"][0]["registrations"], 0);

    let missing = uuid::Uuid::new_v4();
    let (status, body) = server
        .post(
            &format!("/api/v1/events/{missing}/registrations"),
            Some(&organiser),
            json!({ "ticket_category": "GA" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 2001);
}

#[tokio::test]
async fn unknown_category_records_na_price() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let organiser = server.signed_up("org@example.com").await;
    let event_id = server
        .create_event(&organiser, "Launch", json!([{ "category": "GA", "price": "100" }]))
        .await;

    let (status, body) = server
        .post(
            &format!("/api/v1/events/{event_id}/registrations"),
            Some(&organiser),
            json!({ "ticket_category": "Balcony" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["registration"]["price"].is_null());
    assert_eq!(body["displayed_price"], "N/A");
}

#[tokio::test]
async fn duplicate_registrations_follow_policy() {
    let lenient = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let strict = spawn_app(RegistrationPolicy::OnePerUser).await;

    for (server, second_status) in [
        (&lenient, StatusCode::CREATED),
        (&strict, StatusCode::CONFLICT),
    ] {
        let user = server.signed_up("u@example.com").await;
        let event_id = server
            .create_event(&user, "Gala", json!([{ "category": "VIP", "price": "5" }]))
            .await;
        let path = format!("/api/v1/events/{event_id}/registrations");
        let body = json!({ "ticket_category": "VIP" });

        let (first, _) = server.post(&path, Some(&user), body.clone()).await;
        assert_eq!(first, StatusCode::CREATED);
        let (second, _) = server.post(&path, Some(&user), body).await;
        assert_eq!(second, second_status);
    }
}

#[tokio::test]
async fn event_form_requires_fields_and_sign_in() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let organiser = server.signed_up("org@example.com").await;

    let (status, body) = server
        .post(
            "/api/v1/events",
            Some(&organiser),
            json!({ "description": "d", "audience": "a", "date": "2025-01-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Name is required");

    let (status, _) = server
        .post(
            "/api/v1/events",
            None,
            json!({ "name": "n", "description": "d", "audience": "a", "date": "2025-01-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = server
        .post(
            "/api/v1/events",
            Some("not-a-session"),
            json!({ "name": "n" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], 1002);
}

#[tokio::test]
async fn search_matches_name_case_insensitively() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let organiser = server.signed_up("org@example.com").await;
    for name in ["Rust Meetup", "Launch", "RUSTCONF"] {
        server.create_event(&organiser, name, json!([])).await;
    }

    let (_, all) = server.get("/api/v1/events?q=", None).await;
    assert_eq!(all["total"], 3);

    let (_, hits) = server.get("/api/v1/events?q=rust", None).await;
    assert_eq!(hits["total"], 2);
    let (_, again) = server.get("/api/v1/events?q=rust", None).await;
    assert_eq!(hits["events"], again["events"]);

    let (_, none) = server.get("/api/v1/events?q=opera", None).await;
    assert_eq!(none["total"], 0);
}

#[tokio::test]
async fn reviews_are_written_and_listed() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let user = server.signed_up("u@example.com").await;
    let event_id = server.create_event(&user, "Launch", json!([])).await;
    let path = format!("/api/v1/events/{event_id}/reviews");

    let (status, body) = server.post(&path, Some(&user), json!({ "review": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Please write a review before submitting!");

    let (status, body) = server.post(&path, None, json!({ "review": "Nice" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "You must be logged in to submit a review!");

    let (status, body) = server
        .post(&path, Some(&user), json!({ "review": "Great launch" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Review submitted successfully!");

    let (status, body) = server.get(&path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reviews"][0]["review"], "Great launch");
}

#[tokio::test]
async fn sign_in_surfaces_provider_errors() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    server.signed_up("known@example.com").await;

    let (_, body) = server.post("/api/v1/sessions", None, json!({})).await;
    let Some(session) = body["session_id"].as_str().map(str::to_string) else {
        panic!("session id missing");
    };
    let sign_in = format!("/api/v1/sessions/{session}/sign-in");

    let (status, body) = server
        .post(
            &sign_in,
            None,
            json!({ "email": "known@example.com", "password": "wrong-pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], 1003);
    assert_eq!(body["error"]["details"], "auth/wrong-password");

    let (_, body) = server
        .post(&sign_in, None, json!({ "email": "nope", "password": "x" }))
        .await;
    assert_eq!(body["error"]["details"], "auth/invalid-email");

    let (status, body) = server
        .post(
            &format!("/api/v1/sessions/{session}/federated"),
            None,
            json!({ "credential": null }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["details"], "auth/popup-closed-by-user");

    let (status, body) = server
        .post(
            &sign_in,
            None,
            json!({ "email": "known@example.com", "password": "secret-pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["route"], "dashboard");
}

#[tokio::test]
async fn route_guard_follows_sign_out() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let session = server.signed_up("u@example.com").await;
    let route = |path: &str| format!("/api/v1/sessions/{session}/route?path={path}");

    let (status, body) = server.get(&route("/my-events"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["route"], "my_events");
    assert_eq!(body["path"], "/my-events");

    let (status, body) = server
        .post(&format!("/api/v1/sessions/{session}/sign-out"), None, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["auth"]["status"], "signed_out");

    let (_, body) = server.get(&route("/my-events"), None).await;
    assert_eq!(body["path"], "/login");

    let (status, _) = server.get("/api/v1/my-events", Some(&session)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = server.get(&route("/admin"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn closed_session_is_forgotten() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let session = server.signed_up("u@example.com").await;

    let (status, body) = server.get(&format!("/api/v1/sessions/{session}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["auth"]["status"], "signed_in");
    assert_eq!(body["auth"]["identity"]["email"], "u@example.com");

    let (status, _) = server
        .call(
            reqwest::Method::DELETE,
            &format!("/api/v1/sessions/{session}"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = server.get(&format!("/api/v1/sessions/{session}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 2002);

    let (status, _) = server.get("/api/v1/my-events", Some(&session)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_open_sessions() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    server.signed_up("u@example.com").await;
    let (status, body) = server.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["sessions"], 1);
}

#[cfg(feature = "swagger-ui")]
#[tokio::test]
async fn openapi_document_is_served() {
    let server = spawn_app(RegistrationPolicy::AllowDuplicates).await;
    let response = tokio_test::assert_ok!(
        server
            .client
            .get(server.url("/api-doc/openapi.json"))
            .send()
            .await
    );
    assert_eq!(response.status(), StatusCode::OK);
    let doc: serde_json::Value = tokio_test::assert_ok!(response.json().await);
    assert!(doc["paths"]["/api/v1/events"].is_object());
}
