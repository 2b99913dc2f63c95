//! Profiles and the follow graph.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::models::{NewProfile, Privacy, Profile, ProfileChanges, ProfileFollow, ProfileWithUser};

const PROFILE_WITH_USER: &str = "SELECT p.id, p.user_id, p.display_name, p.privacy, \
     p.avatar_version, p.is_notifications_enabled, p.fitness_experience, p.experience_points, \
     p.created_at, p.updated_at, u.first_name, u.last_name, u.country \
     FROM profiles p INNER JOIN users u ON p.user_id = u.id";

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<ProfileWithUser>, AppError>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Profile>, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    async fn create(
        &self,
        conn: &mut SqliteConnection,
        profile: &NewProfile,
    ) -> Result<Profile, AppError>;
    async fn update(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        changes: &ProfileChanges,
    ) -> Result<(), AppError>;
}

pub struct SqlProfileRepository {
    pool: SqlitePool,
}

impl SqlProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for SqlProfileRepository {
    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<ProfileWithUser>, AppError> {
        let sql = format!("{PROFILE_WITH_USER} WHERE p.user_id = ?");
        Ok(sqlx::query_as::<_, ProfileWithUser>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Profile>, AppError> {
        Ok(sqlx::query_as::<_, Profile>(
            "SELECT id, user_id, display_name, privacy, avatar_version, is_notifications_enabled, \
             fitness_experience, experience_points, created_at, updated_at \
             FROM profiles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn create(
        &self,
        conn: &mut SqliteConnection,
        profile: &NewProfile,
    ) -> Result<Profile, AppError> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO profiles \
             (user_id, display_name, privacy, avatar_version, is_notifications_enabled, \
              fitness_experience, experience_points, created_at, updated_at) \
             VALUES (?, ?, ?, 0, 1, 'beginner', 0, ?, ?)",
        )
        .bind(profile.user_id)
        .bind(&profile.display_name)
        .bind(Privacy::Public)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        Ok(Profile {
            id,
            user_id: profile.user_id,
            display_name: profile.display_name.clone(),
            privacy: Privacy::Public,
            avatar_version: 0,
            is_notifications_enabled: true,
            fitness_experience: "beginner".to_string(),
            experience_points: 0,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        changes: &ProfileChanges,
    ) -> Result<(), AppError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE profiles SET updated_at = ");
        query.push_bind(Utc::now());
        if let Some(display_name) = &changes.display_name {
            query.push(", display_name = ").push_bind(display_name.clone());
        }
        if let Some(avatar_version) = changes.avatar_version {
            query.push(", avatar_version = ").push_bind(avatar_version);
        }
        if let Some(enabled) = changes.is_notifications_enabled {
            query.push(", is_notifications_enabled = ").push_bind(enabled);
        }
        if let Some(privacy) = changes.privacy {
            query.push(", privacy = ").push_bind(privacy);
        }
        if let Some(experience) = &changes.fitness_experience {
            query.push(", fitness_experience = ").push_bind(experience.clone());
        }
        query.push(" WHERE id = ").push_bind(id);

        let result = query.build().execute(&mut *conn).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("profile {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
pub trait ProfileFollowRepository: Send + Sync {
    /// Idempotent: following twice returns the existing edge.
    async fn follow(&self, profile_id: i64, follower_profile_id: i64)
        -> Result<ProfileFollow, AppError>;
    /// Returns whether an edge was removed.
    async fn unfollow(&self, profile_id: i64, follower_profile_id: i64) -> Result<bool, AppError>;
    /// Profiles following `profile_id`.
    async fn followers(&self, profile_id: i64) -> Result<Vec<ProfileWithUser>, AppError>;
    /// Profiles that `profile_id` follows.
    async fn following(&self, profile_id: i64) -> Result<Vec<ProfileWithUser>, AppError>;
}

pub struct SqlProfileFollowRepository {
    pool: SqlitePool,
}

impl SqlProfileFollowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileFollowRepository for SqlProfileFollowRepository {
    async fn follow(
        &self,
        profile_id: i64,
        follower_profile_id: i64,
    ) -> Result<ProfileFollow, AppError> {
        sqlx::query(
            "INSERT OR IGNORE INTO profile_follows (profile_id, follower_profile_id, created_at) \
             VALUES (?, ?, ?)",
        )
        .bind(profile_id)
        .bind(follower_profile_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(sqlx::query_as::<_, ProfileFollow>(
            "SELECT id, profile_id, follower_profile_id, created_at FROM profile_follows \
             WHERE profile_id = ? AND follower_profile_id = ?",
        )
        .bind(profile_id)
        .bind(follower_profile_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn unfollow(&self, profile_id: i64, follower_profile_id: i64) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM profile_follows WHERE profile_id = ? AND follower_profile_id = ?")
                .bind(profile_id)
                .bind(follower_profile_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn followers(&self, profile_id: i64) -> Result<Vec<ProfileWithUser>, AppError> {
        let sql = format!(
            "{PROFILE_WITH_USER} INNER JOIN profile_follows f ON f.follower_profile_id = p.id \
             WHERE f.profile_id = ? ORDER BY f.created_at DESC, f.id DESC"
        );
        Ok(sqlx::query_as::<_, ProfileWithUser>(&sql)
            .bind(profile_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn following(&self, profile_id: i64) -> Result<Vec<ProfileWithUser>, AppError> {
        let sql = format!(
            "{PROFILE_WITH_USER} INNER JOIN profile_follows f ON f.profile_id = p.id \
             WHERE f.follower_profile_id = ? ORDER BY f.created_at DESC, f.id DESC"
        );
        Ok(sqlx::query_as::<_, ProfileWithUser>(&sql)
            .bind(profile_id)
            .fetch_all(&self.pool)
            .await?)
    }
}
