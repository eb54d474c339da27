mod common;

use axum::http::{Method, StatusCode};
use booking_service::models::Role;
use common::{TestApp, TEST_PASSWORD};
use serde_json::json;

async fn login(app: &TestApp, email: &str, password: &str) -> (StatusCode, serde_json::Value) {
    app.request(
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await
}

#[tokio::test]
async fn login_issues_a_working_token() {
    let app = TestApp::spawn().await;
    app.add_user("clerk@example.com", Role::Admin).await;

    let (status, body) = login(&app, "clerk@example.com", TEST_PASSWORD).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("passwordHash").is_none());

    let token = body["token"].as_str().unwrap();
    let (status, me) = app
        .request(Method::GET, "/api/auth/me", Some(token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "clerk@example.com");
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_unauthorized() {
    let app = TestApp::spawn().await;
    app.add_user("clerk@example.com", Role::Admin).await;

    let (status, body) = login(&app, "clerk@example.com", "not-the-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "auth_error");
    assert_eq!(body["message"], "Invalid email or password");

    let (status, _) = login(&app, "nobody@example.com", TEST_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = TestApp::spawn().await;
    let (status, _) = app
        .request(Method::GET, "/api/plots", Some("not.a.jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forgot_password_does_not_reveal_unknown_addresses() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({"email": "nobody@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().starts_with("If your email"));
    assert!(app.email.sent_resets().is_empty());
}

#[tokio::test]
async fn reset_token_changes_password_once() {
    let app = TestApp::spawn().await;
    app.add_user("clerk@example.com", Role::Admin).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({"email": "clerk@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let sent = app.email.sent_resets();
    assert_eq!(sent.len(), 1);
    let (recipient, token) = &sent[0];
    assert_eq!(recipient, "clerk@example.com");

    let reset_uri = format!("/api/auth/reset-password/{}", token);
    let (status, _) = app
        .request(
            Method::POST,
            &reset_uri,
            None,
            Some(json!({"password": "a-brand-new-secret"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = login(&app, "clerk@example.com", "a-brand-new-secret").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = login(&app, "clerk@example.com", TEST_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(
            Method::POST,
            &reset_uri,
            None,
            Some(json!({"password": "yet-another-secret"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn short_reset_password_is_a_field_error() {
    let app = TestApp::spawn().await;
    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/reset-password/whatever",
            None,
            Some(json!({"password": "short"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "password");
}

#[tokio::test]
async fn only_superadmin_creates_users() {
    let app = TestApp::spawn().await;
    let new_user = json!({
        "email": "new.clerk@example.com",
        "name": "New Clerk",
        "password": "long-enough-password"
    });

    let (status, _) = app.post("/api/auth/users", new_user.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/users",
            Some(&app.superadmin_token),
            Some(new_user.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["role"], "admin");

    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/users",
            Some(&app.superadmin_token),
            Some(new_user),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = login(&app, "new.clerk@example.com", "long-enough-password").await;
    assert_eq!(status, StatusCode::OK);
}
