// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::response::IntoResponse;
use axum::http::StatusCode;
use ronin_fitness::error::AppError;

mod common;

async fn envelope(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    (response.status(), common::body_json(response).await)
}

#[tokio::test]
async fn test_client_errors_are_bad_request() {
    for err in [
        AppError::InvalidRequestBody("expected value at line 1".to_string()),
        AppError::Validation("invalid fields: email: email".to_string()),
        AppError::BadRequest("cannot follow yourself".to_string()),
        AppError::NothingToUpdate,
        AppError::VerificationCodeExpired,
    ] {
        let (status, body) = envelope(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body.get("data").is_none());
    }
}

#[tokio::test]
async fn test_body_details_are_not_leaked() {
    let (_, body) = envelope(AppError::InvalidRequestBody(
        "missing field `password`".to_string(),
    ))
    .await;
    assert_eq!(body["error"], "invalid request body");
}

#[tokio::test]
async fn test_auth_errors_are_unauthorized() {
    for err in [
        AppError::Unauthorized,
        AppError::InvalidToken,
        AppError::TokenExpired,
        AppError::InvalidEmailOrPassword,
    ] {
        assert_eq!(envelope(err).await.0, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_internal_errors_are_generic() {
    let (status, body) = envelope(AppError::Internal(anyhow::anyhow!(
        "secret connection string"
    )))
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal server error");
}

#[tokio::test]
async fn test_not_found_names_the_resource() {
    let (status, body) = envelope(AppError::NotFound("profile".to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "profile not found");
}
