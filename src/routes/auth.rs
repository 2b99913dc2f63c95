// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account authentication routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::extractors::ValidatedJson;
use crate::response::ApiResponse;
use crate::services::auth::{
    LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest, RegisterResponse,
    TokenPair, VerifyAccountRequest,
};
use crate::services::users::UserResponse;
use crate::services::ClientInfo;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/refresh-token", post(refresh_token))
        .route("/api/auth/verify-account", post(verify_account))
        .route("/api/auth/logout", post(logout))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    let response = state.auth_service.login(&req, &client).await?;
    Ok(ApiResponse::ok(response))
}

/// Create an account, its profile, a verification code and a first session.
async fn register(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisterResponse>>)> {
    let response = state.auth_service.register(&req, &client).await?;
    Ok(ApiResponse::created(response))
}

async fn refresh_token(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<ApiResponse<TokenPair>>> {
    let tokens = state.auth_service.refresh(&req.refresh_token).await?;
    Ok(ApiResponse::ok(tokens))
}

async fn verify_account(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<VerifyAccountRequest>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let user = state.auth_service.verify_account(&req).await?;
    Ok(ApiResponse::ok(user))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>> {
    state.auth_service.logout(&req.refresh_token).await?;
    Ok(ApiResponse::ok(MessageResponse {
        message: "logged out".to_string(),
    }))
}
