//! Session issuing and sign-out tests

mod common;

use std::sync::Arc;

use axum_test::TestServer;
use common::{create_test_server, SESSION_COOKIE};
use landlease_server::{
    create_router, AppState, InMemoryLandStore, InMemorySessionStore, InMemoryUserStore,
};
use serde_json::{json, Value};

/// Test: the test route issues a session cookie usable by later requests
#[tokio::test]
async fn test_test_session_sets_cookie() {
    let (server, _state) = create_test_server();

    let response = server
        .post("/api/test/session")
        .json(&json!({
            "external_id": "user_e2e",
            "email": "e2e@example.com",
            "name": "E2E",
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let session = response.cookie(SESSION_COOKIE);
    assert!(!session.value().is_empty());

    let body: Value = server
        .get("/api/user/status")
        .add_cookie(cookie::Cookie::new(SESSION_COOKIE, session.value().to_string()))
        .await
        .json();
    assert_eq!(body["status"], "needs_role");
}

/// Test: sign-out ends the session
#[tokio::test]
async fn test_sign_out_ends_session() {
    let (server, state) = create_test_server();
    let session = common::sign_in(&state, "user_out");

    let response = server.post("/api/sign-out").add_cookie(session.clone()).await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let response = server.get("/api/user/status").add_cookie(session).await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"], "authentication_required");
}

/// Test: the test route is absent unless enabled
#[tokio::test]
async fn test_test_routes_disabled_by_default() {
    let state = Arc::new(AppState::new(
        InMemoryUserStore::new(),
        InMemoryLandStore::new(),
        InMemorySessionStore::new(),
        None,
    ));
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .post("/api/test/session")
        .json(&json!({ "external_id": "x", "email": "x@example.com", "name": "X" }))
        .await;

    assert_eq!(response.status_code(), 404);
}

/// Test: a custom session cookie name is honored
#[tokio::test]
async fn test_custom_cookie_name() {
    let state = Arc::new(
        AppState::new(
            InMemoryUserStore::new(),
            InMemoryLandStore::new(),
            InMemorySessionStore::new(),
            None,
        )
        .with_session_cookie("ll_session"),
    );
    let server = common::server_for(state.clone());
    let session = common::sign_in(&state, "user_custom");

    // Default cookie name is ignored
    let response = server.get("/api/user/status").add_cookie(session.clone()).await;
    assert_eq!(response.status_code(), 401);

    let response = server
        .get("/api/user/status")
        .add_cookie(cookie::Cookie::new("ll_session", session.value().to_string()))
        .await;
    assert_eq!(response.status_code(), 200);
}
