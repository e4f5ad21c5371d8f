mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::{Duration, Utc};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn missing_token_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/auth", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "msg": "No Token, Authorization Failed" }));
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/auth", Some("not.a.token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "msg": "Token is not valid" }));
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = TestApp::new();
    let (user, _) = app.user("Alice").await;

    let issued = Utc::now() - Duration::seconds(app.authenticator.expiry_secs() + 60);
    let stale = app.authenticator.issue_at(user.id, issued).unwrap();

    let (status, _) = app.get("/api/auth", Some(&stale)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_returns_user_without_credentials() {
    let app = TestApp::new();
    let (user, token) = app.user("Alice").await;

    let (status, body) = app.get("/api/auth", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["_id"], json!(user.id));
    assert_eq!(body["name"], "Alice");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn bearer_header_is_accepted() {
    let app = TestApp::new();
    let (_, token) = app.user("Alice").await;

    let request = Request::builder()
        .uri("/api/auth")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn public_profile_reads_need_no_token() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/profile", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    // Same path, protected method
    let (status, _) = app.call(Method::DELETE, "/api/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

async fn login(app: &TestApp, email: &str, password: &str) -> (StatusCode, serde_json::Value) {
    app.call(
        Method::POST,
        "/api/auth",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

#[tokio::test]
async fn login_returns_a_working_token() {
    let app = TestApp::new();
    let user = app.user_with_password("Alice", "correct horse").await;

    let (status, body) = login(&app, "ALICE@example.com", "correct horse").await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token string");

    let (status, me) = app.get("/api/auth", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["_id"], json!(user.id));
}

#[tokio::test]
async fn login_with_unknown_email_is_invalid_credentials() {
    let app = TestApp::new();
    app.user_with_password("Alice", "correct horse").await;

    let (status, body) = login(&app, "mallory@example.com", "correct horse").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": [{ "msg": "Invalid credentials" }] }));
}

#[tokio::test]
async fn login_with_wrong_password_is_invalid_credentials() {
    let app = TestApp::new();
    app.user_with_password("Alice", "correct horse").await;

    let (status, body) = login(&app, "alice@example.com", "battery staple").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": [{ "msg": "Invalid credentials" }] }));
}

#[tokio::test]
async fn login_reports_missing_fields() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::POST, "/api/auth", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "errors": [
            { "msg": "Please include a valid email", "param": "email" },
            { "msg": "Password is required", "param": "password" },
        ] })
    );
}
