// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login, token refresh and logout through the HTTP API.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use ronin_fitness::config::Config;
use ronin_fitness::services::tokens::hash_token;
use serde_json::json;
use std::sync::Arc;

mod common;

#[tokio::test]
async fn test_register_creates_user_profile_code_and_session() {
    let app = common::create_test_app().await;

    let (user_id, token, refresh_token) = app.register("Ann", "Ann@Example.com ").await;
    assert!(user_id > 0);
    assert!(!token.is_empty());
    assert!(!refresh_token.is_empty());

    // Password is stored hashed and email normalized
    let (email, password): (String, String) =
        sqlx::query_as("SELECT email, password FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(app.state.db.pool())
            .await
            .unwrap();
    assert_eq!(email, "ann@example.com");
    assert!(password.starts_with("$2"));
    assert_ne!(password, "correct horse battery");

    // Exactly one of each dependent row
    assert_eq!(app.count("profiles").await, 1);
    assert_eq!(app.count("verification_codes").await, 1);
    assert_eq!(app.count("refresh_tokens").await, 1);

    let code: String = sqlx::query_scalar("SELECT code FROM verification_codes WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(app.state.db.pool())
        .await
        .unwrap();
    assert_eq!(code.len(), 5);
    assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

    // Refresh token row is hashed, carries client info and expires in ~30 days
    let record = app
        .state
        .repos
        .refresh_tokens
        .get_by_hash(&hash_token(&refresh_token))
        .await
        .unwrap()
        .expect("refresh token should be stored");
    assert_eq!(record.user_id, user_id);
    assert_eq!(record.user_agent, "ronin-tests/1.0");
    assert_eq!(record.ip_address, "203.0.113.7");
    let ttl = record.expires_at - Utc::now();
    assert!(ttl > Duration::days(30) - Duration::minutes(1));
    assert!(ttl <= Duration::days(30));

    // Verification email carries the code
    let sent = app.mailer.messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ann@example.com");
    assert!(sent[0].html.contains(&code));

    // Default profile
    let (status, body) = app.json("GET", "/api/profile/me", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["display_name"], "A.Bower");
    assert_eq!(body["data"]["privacy"], "public");
    assert_eq!(body["data"]["fitness_experience"], "beginner");
}

#[tokio::test]
async fn test_forwarded_for_ignored_without_trusted_proxy() {
    let app = common::create_test_app_with_config(Config {
        trust_proxy_headers: false,
        ..Config::test_default()
    })
    .await;

    let (_, _, refresh_token) = app.register("Ann", "ann@example.com").await;

    let record = app
        .state
        .repos
        .refresh_tokens
        .get_by_hash(&hash_token(&refresh_token))
        .await
        .unwrap()
        .unwrap();
    // No socket peer under oneshot, and the header is not believed
    assert_eq!(record.ip_address, "unknown");
}

#[tokio::test]
async fn test_password_over_72_bytes_is_rejected() {
    let app = common::create_test_app().await;
    let mut body = common::register_body("Ann", "ann@example.com");
    body["password"] = json!("é".repeat(72));

    let (status, body) = app
        .json("POST", "/api/auth/register", Some(body), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("password"));
    assert_eq!(app.count("users").await, 0);
}

#[tokio::test]
async fn test_password_sharing_72_byte_prefix_does_not_log_in() {
    let app = common::create_test_app().await;
    let mut body = common::register_body("Ann", "ann@example.com");
    body["password"] = json!("é".repeat(36));
    let (status, _) = app
        .json("POST", "/api/auth/register", Some(body), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .json(
            "POST",
            "/api/auth/login",
            Some(json!({"email": "ann@example.com", "password": format!("{}x", "é".repeat(36))})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .json(
            "POST",
            "/api/auth/login",
            Some(json!({"email": "ann@example.com", "password": "é".repeat(36)})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_missing_fields_is_rejected_before_writing() {
    let app = common::create_test_app().await;

    let (status, body) = app
        .json(
            "POST",
            "/api/auth/register",
            Some(json!({"email": "ann@example.com", "password": "pw"})),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("first_name"));
    assert_eq!(app.count("users").await, 0);
}

#[tokio::test]
async fn test_register_bad_birthday() {
    let app = common::create_test_app().await;
    let mut body = common::register_body("Ann", "ann@example.com");
    body["birthday"] = json!("12/04/1990");

    let (status, body) = app
        .json("POST", "/api/auth/register", Some(body), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("birthday"));
    assert_eq!(app.count("users").await, 0);
}

#[tokio::test]
async fn test_register_malformed_json() {
    let app = common::create_test_app().await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "invalid request body");
}

#[tokio::test]
async fn test_duplicate_email_leaves_no_partial_rows() {
    let app = common::create_test_app().await;
    app.register("Ann", "ann@example.com").await;
    let sent_before = app.mailer.messages().len();

    let (status, body) = app
        .json(
            "POST",
            "/api/auth/register",
            Some(common::register_body("Annie", "ANN@example.com")),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal server error");
    assert_eq!(app.count("users").await, 1);
    assert_eq!(app.count("profiles").await, 1);
    assert_eq!(app.count("verification_codes").await, 1);
    assert_eq!(app.count("refresh_tokens").await, 1);
    assert_eq!(app.mailer.messages().len(), sent_before);
}

#[tokio::test]
async fn test_register_succeeds_when_email_fails() {
    let (router, state) =
        common::create_test_app_with_mailer(Arc::new(common::FailingMailer)).await;
    let app = common::TestApp {
        router,
        state,
        mailer: Arc::new(common::RecordingMailer::default()),
    };

    let (user_id, _, _) = app.register("Ann", "ann@example.com").await;
    assert!(user_id > 0);
    assert_eq!(app.count("verification_codes").await, 1);
}

#[tokio::test]
async fn test_login_issues_tokens_and_persists_one_session() {
    let app = common::create_test_app().await;
    let (user_id, _, _) = app.register("Ann", "ann@example.com").await;
    let before = app.count("refresh_tokens").await;

    let (status, body) = app
        .json(
            "POST",
            "/api/auth/login",
            Some(json!({"email": " ANN@example.com", "password": "correct horse battery"})),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert!(!data["token"].as_str().unwrap().is_empty());
    assert!(!data["refresh_token"].as_str().unwrap().is_empty());
    assert_eq!(data["user"]["id"], user_id);
    assert_eq!(data["user"]["name"], "A.Bower");
    assert_eq!(app.count("refresh_tokens").await, before + 1);
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
    let app = common::create_test_app().await;
    app.register("Ann", "ann@example.com").await;

    let (status_unknown, body_unknown) = app
        .json(
            "POST",
            "/api/auth/login",
            Some(json!({"email": "nobody@example.com", "password": "correct horse battery"})),
            None,
        )
        .await;
    let (status_wrong, body_wrong) = app
        .json(
            "POST",
            "/api/auth/login",
            Some(json!({"email": "ann@example.com", "password": "wrong"})),
            None,
        )
        .await;

    assert_eq!(status_unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(status_unknown, status_wrong);
    assert_eq!(body_unknown, body_wrong);
    assert_eq!(body_wrong["error"], "invalid email or password");
}

#[tokio::test]
async fn test_refresh_returns_new_access_token() {
    let app = common::create_test_app().await;
    let (_, _, refresh_token) = app.register("Ann", "ann@example.com").await;

    let (status, body) = app
        .json(
            "POST",
            "/api/auth/refresh-token",
            Some(json!({"refresh_token": refresh_token})),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let access = body["data"]["token"].as_str().unwrap();
    assert!(app.state.tokens.verify_access(access).is_ok());
    // Not rotated
    assert_eq!(body["data"]["refresh_token"], refresh_token.as_str());
}

#[tokio::test]
async fn test_refresh_unknown_token_is_not_found() {
    let app = common::create_test_app().await;

    let (status, body) = app
        .json(
            "POST",
            "/api/auth/refresh-token",
            Some(json!({"refresh_token": "never-issued"})),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_refresh_expired_token_is_unauthorized() {
    let app = common::create_test_app().await;
    let (_, _, refresh_token) = app.register("Ann", "ann@example.com").await;

    sqlx::query("UPDATE refresh_tokens SET expires_at = ?")
        .bind(Utc::now() - Duration::minutes(1))
        .execute(app.state.db.pool())
        .await
        .unwrap();

    let (status, body) = app
        .json(
            "POST",
            "/api/auth/refresh-token",
            Some(json!({"refresh_token": refresh_token})),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "refresh token expired");
}

#[tokio::test]
async fn test_logout_deletes_session() {
    let app = common::create_test_app().await;
    let (_, _, refresh_token) = app.register("Ann", "ann@example.com").await;

    let (status, _) = app
        .json(
            "POST",
            "/api/auth/logout",
            Some(json!({"refresh_token": refresh_token})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.count("refresh_tokens").await, 0);

    // The token no longer refreshes
    let (status, _) = app
        .json(
            "POST",
            "/api/auth/refresh-token",
            Some(json!({"refresh_token": refresh_token})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A second logout with the same token is rejected
    let (status, _) = app
        .json(
            "POST",
            "/api/auth/logout",
            Some(json!({"refresh_token": refresh_token})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
