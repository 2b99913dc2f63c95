// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile reads, partial updates and the follow graph.

use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::{Database, Repositories};
use crate::error::AppError;
use crate::models::{user::format_display_name, Privacy, ProfileChanges, ProfileWithUser};

/// The caller's own profile, including private settings.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MyProfileResponse {
    pub id: i64,
    pub display_name: String,
    pub avatar_version: i64,
    pub privacy: Privacy,
    pub is_notifications_enabled: bool,
    pub fitness_experience: String,
    pub experience_points: i64,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileUserSummary {
    pub id: i64,
    pub name: String,
    pub country: String,
}

/// Profile as seen by other users.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub id: i64,
    pub display_name: String,
    pub avatar_version: i64,
    pub privacy: Privacy,
    pub fitness_experience: String,
    pub experience_points: i64,
    pub user: ProfileUserSummary,
}

impl From<&ProfileWithUser> for MyProfileResponse {
    fn from(p: &ProfileWithUser) -> Self {
        Self {
            id: p.profile.id,
            display_name: p.profile.display_name.clone(),
            avatar_version: p.profile.avatar_version,
            privacy: p.profile.privacy,
            is_notifications_enabled: p.profile.is_notifications_enabled,
            fitness_experience: p.profile.fitness_experience.clone(),
            experience_points: p.profile.experience_points,
        }
    }
}

impl From<&ProfileWithUser> for ProfileResponse {
    fn from(p: &ProfileWithUser) -> Self {
        Self {
            id: p.profile.id,
            display_name: p.profile.display_name.clone(),
            avatar_version: p.profile.avatar_version,
            privacy: p.profile.privacy,
            fitness_experience: p.profile.fitness_experience.clone(),
            experience_points: p.profile.experience_points,
            user: ProfileUserSummary {
                id: p.profile.user_id,
                name: format_display_name(&p.first_name, &p.last_name),
                country: p.country.clone(),
            },
        }
    }
}

/// Partial update. Absent, empty and zero values are ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 50))]
    pub display_name: Option<String>,
    #[validate(range(min = 0))]
    pub avatar_version: Option<i64>,
    pub is_notifications_enabled: Option<bool>,
    pub privacy: Option<Privacy>,
    #[validate(length(max = 50))]
    pub fitness_experience: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FollowRequest {
    #[validate(range(min = 1))]
    pub following_profile_id: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FollowResponse {
    pub following_profile_id: i64,
}

pub struct ProfileService {
    db: Database,
    repos: Repositories,
}

impl ProfileService {
    pub fn new(db: Database, repos: Repositories) -> Self {
        Self { db, repos }
    }

    async fn by_user_id(&self, user_id: i64) -> Result<ProfileWithUser, AppError> {
        self.repos
            .profiles
            .get_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("profile".to_string()))
    }

    pub async fn my_profile(&self, user_id: i64) -> Result<MyProfileResponse, AppError> {
        Ok(MyProfileResponse::from(&self.by_user_id(user_id).await?))
    }

    pub async fn profile_for_user(&self, user_id: i64) -> Result<ProfileResponse, AppError> {
        Ok(ProfileResponse::from(&self.by_user_id(user_id).await?))
    }

    pub async fn update(
        &self,
        user_id: i64,
        req: &UpdateProfileRequest,
    ) -> Result<MyProfileResponse, AppError> {
        let current = self.by_user_id(user_id).await?;
        let changes = changes_for(&current, req);
        if changes.is_empty() {
            return Err(AppError::NothingToUpdate);
        }

        let mut tx = self.db.begin().await?;
        self.repos
            .profiles
            .update(&mut tx, current.profile.id, &changes)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id, profile_id = current.profile.id, "Profile updated");
        self.my_profile(user_id).await
    }

    /// Make the caller's profile follow `target_profile_id`.
    pub async fn follow(
        &self,
        user_id: i64,
        target_profile_id: i64,
    ) -> Result<FollowResponse, AppError> {
        let me = self.by_user_id(user_id).await?;
        if me.profile.id == target_profile_id {
            return Err(AppError::BadRequest("cannot follow yourself".to_string()));
        }

        self.repos
            .profiles
            .get_by_id(target_profile_id)
            .await?
            .ok_or_else(|| AppError::NotFound("profile".to_string()))?;

        let edge = self
            .repos
            .profile_follows
            .follow(target_profile_id, me.profile.id)
            .await?;

        Ok(FollowResponse {
            following_profile_id: edge.profile_id,
        })
    }

    /// Idempotent: unfollowing a profile you don't follow succeeds.
    pub async fn unfollow(
        &self,
        user_id: i64,
        target_profile_id: i64,
    ) -> Result<FollowResponse, AppError> {
        let me = self.by_user_id(user_id).await?;
        let removed = self
            .repos
            .profile_follows
            .unfollow(target_profile_id, me.profile.id)
            .await?;
        tracing::debug!(removed, target_profile_id, "Unfollow");

        Ok(FollowResponse {
            following_profile_id: target_profile_id,
        })
    }

    pub async fn followers(&self, user_id: i64) -> Result<Vec<ProfileResponse>, AppError> {
        let profile = self.by_user_id(user_id).await?;
        let rows = self
            .repos
            .profile_follows
            .followers(profile.profile.id)
            .await?;
        Ok(rows.iter().map(ProfileResponse::from).collect())
    }

    pub async fn following(&self, user_id: i64) -> Result<Vec<ProfileResponse>, AppError> {
        let profile = self.by_user_id(user_id).await?;
        let rows = self
            .repos
            .profile_follows
            .following(profile.profile.id)
            .await?;
        Ok(rows.iter().map(ProfileResponse::from).collect())
    }
}

/// Fields of `req` that are set, non-empty and differ from `current`.
fn changes_for(current: &ProfileWithUser, req: &UpdateProfileRequest) -> ProfileChanges {
    let p = &current.profile;

    let non_empty = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    ProfileChanges {
        display_name: non_empty(&req.display_name).filter(|v| *v != p.display_name),
        avatar_version: req
            .avatar_version
            .filter(|v| *v != 0 && *v != p.avatar_version),
        is_notifications_enabled: req
            .is_notifications_enabled
            .filter(|v| *v != p.is_notifications_enabled),
        privacy: req.privacy.filter(|v| *v != p.privacy),
        fitness_experience: non_empty(&req.fitness_experience)
            .filter(|v| *v != p.fitness_experience),
    }
}
