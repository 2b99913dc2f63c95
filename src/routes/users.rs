// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User directory routes (require authentication).

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::response::ApiResponse;
use crate::services::users::UserResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/{id}", get(get_user))
}

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<Vec<UserResponse>>>> {
    Ok(ApiResponse::ok(state.user_service.list().await?))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::ok(state.user_service.get(id).await?))
}

/// Path ids are parsed by hand so a bad id gets the envelope, not axum's text.
pub(crate) fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("id must be a valid integer".to_string()))
}
