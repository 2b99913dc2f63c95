//! User persistence.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "id, first_name, last_name, email, password, birthday, country, \
                            is_verified, created_at, updated_at";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn get_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    async fn count_verified(&self) -> Result<i64, AppError>;
    async fn create(&self, conn: &mut SqliteConnection, user: &NewUser) -> Result<User, AppError>;
    async fn mark_verified(&self, conn: &mut SqliteConnection, id: i64) -> Result<(), AppError>;
}

pub struct SqlUserRepository {
    pool: SqlitePool,
}

impl SqlUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqlUserRepository {
    async fn list(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn count_verified(&self) -> Result<i64, AppError> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE is_verified = 1")
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn create(&self, conn: &mut SqliteConnection, user: &NewUser) -> Result<User, AppError> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO users \
             (first_name, last_name, email, password, birthday, country, is_verified, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.birthday)
        .bind(&user.country)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        Ok(User {
            id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            password: user.password_hash.clone(),
            birthday: user.birthday,
            country: user.country.clone(),
            is_verified: false,
            created_at: now,
            updated_at: now,
        })
    }

    async fn mark_verified(&self, conn: &mut SqliteConnection, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET is_verified = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }
}
