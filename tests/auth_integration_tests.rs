mod common;

use axum::http::StatusCode;
use common::{TestHarness, get_authed, post_json};
use serde_json::json;

#[tokio::test]
async fn test_register_creates_user() {
    let harness = TestHarness::setup().await;
    let app = harness.app();

    let (status, body) = post_json(
        &app,
        "/auth/register",
        json!({"name": "Ada Lovelace", "email": "ada@example.com", "password": "password1"}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["role"], "user");
    // Secret material never leaves the API.
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let harness = TestHarness::setup().await;
    let app = harness.app();

    let payload = json!({"name": "Ada", "email": "dup@example.com", "password": "password1"});
    let (status, _) = post_json(&app, "/auth/register", payload.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = post_json(&app, "/auth/register", payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_rejects_invalid_payloads() {
    let harness = TestHarness::setup().await;
    let app = harness.app();

    let cases = [
        json!({"name": "Al", "email": "al@example.com", "password": "password1"}),
        json!({"name": "Ada", "email": "not-an-email", "password": "password1"}),
        json!({"name": "Ada", "email": "ada@example.com", "password": "short"}),
    ];
    for payload in cases {
        let (status, _) = post_json(&app, "/auth/register", payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
    }
}

#[tokio::test]
async fn test_login_returns_usable_token() {
    let harness = TestHarness::setup().await;
    let app = harness.app();

    post_json(
        &app,
        "/auth/register",
        json!({"name": "Ada", "email": "ada@example.com", "password": "password1"}),
    )
    .await;

    let (status, body) = post_json(
        &app,
        "/auth/login",
        json!({"email": "ada@example.com", "password": "password1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ada@example.com");

    let token = body["token"].as_str().unwrap();
    let (status, me) = get_authed(&app, "/auth/me", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let harness = TestHarness::setup().await;
    let app = harness.app();

    post_json(
        &app,
        "/auth/register",
        json!({"name": "Ada", "email": "ada@example.com", "password": "password1"}),
    )
    .await;

    let (wrong_pw_status, wrong_pw_body) = post_json(
        &app,
        "/auth/login",
        json!({"email": "ada@example.com", "password": "wrong-password"}),
    )
    .await;
    let (unknown_status, unknown_body) = post_json(
        &app,
        "/auth/login",
        json!({"email": "ghost@example.com", "password": "password1"}),
    )
    .await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    // Identical bodies, so attackers cannot probe for registered emails.
    assert_eq!(wrong_pw_body, unknown_body);
}

#[tokio::test]
async fn test_me_requires_valid_token() {
    let harness = TestHarness::setup().await;
    let app = harness.app();

    let (status, _) = get_authed(&app, "/auth/me", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::get(&app, "/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
