// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile and follow routes (require authentication).

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;

use crate::error::Result;
use crate::extractors::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::users::parse_id;
use crate::services::profiles::{
    FollowRequest, FollowResponse, MyProfileResponse, ProfileResponse, UpdateProfileRequest,
};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile/me", get(get_my_profile).put(update_my_profile))
        .route("/api/profile/follow", post(follow))
        .route("/api/profile/unfollow", post(unfollow))
        .route("/api/profile/{user_id}", get(get_profile))
        .route("/api/profile/{user_id}/followers", get(get_followers))
        .route("/api/profile/{user_id}/following", get(get_following))
}

async fn get_my_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<MyProfileResponse>>> {
    Ok(ApiResponse::ok(
        state.profile_service.my_profile(user.user_id).await?,
    ))
}

async fn update_my_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<MyProfileResponse>>> {
    Ok(ApiResponse::ok(
        state.profile_service.update(user.user_id, &req).await?,
    ))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<ProfileResponse>>> {
    let user_id = parse_id(&user_id)?;
    Ok(ApiResponse::ok(
        state.profile_service.profile_for_user(user_id).await?,
    ))
}

async fn get_followers(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ProfileResponse>>>> {
    let user_id = parse_id(&user_id)?;
    Ok(ApiResponse::ok(
        state.profile_service.followers(user_id).await?,
    ))
}

async fn get_following(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ProfileResponse>>>> {
    let user_id = parse_id(&user_id)?;
    Ok(ApiResponse::ok(
        state.profile_service.following(user_id).await?,
    ))
}

async fn follow(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<FollowRequest>,
) -> Result<Json<ApiResponse<FollowResponse>>> {
    Ok(ApiResponse::ok(
        state
            .profile_service
            .follow(user.user_id, req.following_profile_id)
            .await?,
    ))
}

async fn unfollow(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<FollowRequest>,
) -> Result<Json<ApiResponse<FollowResponse>>> {
    Ok(ApiResponse::ok(
        state
            .profile_service
            .unfollow(user.user_id, req.following_profile_id)
            .await?,
    ))
}
