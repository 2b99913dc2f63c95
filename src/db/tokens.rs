//! Refresh-token sessions and email verification codes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::models::{NewRefreshToken, NewVerificationCode, RefreshToken, VerificationCode};

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn create(
        &self,
        conn: &mut SqliteConnection,
        token: &NewRefreshToken,
    ) -> Result<RefreshToken, AppError>;
    async fn get_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, AppError>;
    /// Returns whether a row was removed.
    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, AppError>;
    /// Drop tokens that expired before `now`. Returns the number removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

pub struct SqlRefreshTokenRepository {
    pool: SqlitePool,
}

impl SqlRefreshTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for SqlRefreshTokenRepository {
    async fn create(
        &self,
        conn: &mut SqliteConnection,
        token: &NewRefreshToken,
    ) -> Result<RefreshToken, AppError> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO refresh_tokens \
             (user_id, token_hash, user_agent, ip_address, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(&token.user_agent)
        .bind(&token.ip_address)
        .bind(token.expires_at)
        .bind(now)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        Ok(RefreshToken {
            id,
            user_id: token.user_id,
            token_hash: token.token_hash.clone(),
            user_agent: token.user_agent.clone(),
            ip_address: token.ip_address.clone(),
            expires_at: token.expires_at,
            created_at: now,
        })
    }

    async fn get_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, AppError> {
        Ok(sqlx::query_as::<_, RefreshToken>(
            "SELECT id, user_id, token_hash, user_agent, ip_address, expires_at, created_at \
             FROM refresh_tokens WHERE token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
pub trait VerificationCodeRepository: Send + Sync {
    async fn create(
        &self,
        conn: &mut SqliteConnection,
        code: &NewVerificationCode,
    ) -> Result<VerificationCode, AppError>;
    async fn get_by_code(
        &self,
        code: &str,
        user_id: i64,
    ) -> Result<Option<VerificationCode>, AppError>;
    /// Invalidate every outstanding code for the user.
    async fn delete_for_user(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<u64, AppError>;
}

pub struct SqlVerificationCodeRepository {
    pool: SqlitePool,
}

impl SqlVerificationCodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationCodeRepository for SqlVerificationCodeRepository {
    async fn create(
        &self,
        conn: &mut SqliteConnection,
        code: &NewVerificationCode,
    ) -> Result<VerificationCode, AppError> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO verification_codes (user_id, email, code, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(code.user_id)
        .bind(&code.email)
        .bind(&code.code)
        .bind(code.expires_at)
        .bind(now)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        Ok(VerificationCode {
            id,
            user_id: code.user_id,
            email: code.email.clone(),
            code: code.code.clone(),
            expires_at: code.expires_at,
            created_at: now,
        })
    }

    async fn get_by_code(
        &self,
        code: &str,
        user_id: i64,
    ) -> Result<Option<VerificationCode>, AppError> {
        Ok(sqlx::query_as::<_, VerificationCode>(
            "SELECT id, user_id, email, code, expires_at, created_at \
             FROM verification_codes WHERE code = ? AND user_id = ? \
             ORDER BY id DESC LIMIT 1",
        )
        .bind(code)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_for_user(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM verification_codes WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
