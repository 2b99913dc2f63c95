//! CMS administrator accounts and sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{AdminSession, AdminUser, NewAdminUser};

#[async_trait]
pub trait AdminUserRepository: Send + Sync {
    async fn get_by_id(&self, id: i64) -> Result<Option<AdminUser>, AppError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<AdminUser>, AppError>;
    async fn create(&self, admin: &NewAdminUser) -> Result<AdminUser, AppError>;
}

pub struct SqlAdminUserRepository {
    pool: SqlitePool,
}

impl SqlAdminUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const ADMIN_COLUMNS: &str = "id, first_name, last_name, email, password, created_at, updated_at";

#[async_trait]
impl AdminUserRepository for SqlAdminUserRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<AdminUser>, AppError> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admin_users WHERE id = ?");
        Ok(sqlx::query_as::<_, AdminUser>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<AdminUser>, AppError> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admin_users WHERE email = ?");
        Ok(sqlx::query_as::<_, AdminUser>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, admin: &NewAdminUser) -> Result<AdminUser, AppError> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO admin_users (first_name, last_name, email, password, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&admin.first_name)
        .bind(&admin.last_name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(AdminUser {
            id,
            first_name: admin.first_name.clone(),
            last_name: admin.last_name.clone(),
            email: admin.email.clone(),
            password: admin.password_hash.clone(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[async_trait]
pub trait AdminSessionRepository: Send + Sync {
    async fn create(
        &self,
        admin_user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AdminSession, AppError>;
    async fn get_by_hash(&self, token_hash: &str) -> Result<Option<AdminSession>, AppError>;
    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, AppError>;
    /// Drop sessions that expired before `now`. Returns the number removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

pub struct SqlAdminSessionRepository {
    pool: SqlitePool,
}

impl SqlAdminSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminSessionRepository for SqlAdminSessionRepository {
    async fn create(
        &self,
        admin_user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AdminSession, AppError> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO admin_sessions (token_hash, admin_user_id, expires_at, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(token_hash)
        .bind(admin_user_id)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(AdminSession {
            id,
            token_hash: token_hash.to_string(),
            admin_user_id,
            expires_at,
            created_at: now,
        })
    }

    async fn get_by_hash(&self, token_hash: &str) -> Result<Option<AdminSession>, AppError> {
        Ok(sqlx::query_as::<_, AdminSession>(
            "SELECT id, token_hash, admin_user_id, expires_at, created_at \
             FROM admin_sessions WHERE token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
