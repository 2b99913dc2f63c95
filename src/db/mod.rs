//! Database layer (SQLite via sqlx).
//!
//! Each entity has a repository trait with a SQL implementation. Writes that
//! take part in a multi-step flow accept a `&mut SqliteConnection` so the
//! caller can pass an open transaction.

pub mod admin;
pub mod profiles;
pub mod tokens;
pub mod users;

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::AppError;

pub use admin::{AdminSessionRepository, AdminUserRepository};
pub use profiles::{ProfileFollowRepository, ProfileRepository};
pub use tokens::{RefreshTokenRepository, VerificationCodeRepository};
pub use users::UserRepository;

/// Pooled database handle, constructed once and passed down.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database at `url` and run pending migrations.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;

        tracing::info!(url = %redact_url(url), "Connected to database");
        Ok(db)
    }

    /// Private in-memory database with the schema applied.
    ///
    /// Pinned to a single connection that never expires, since each SQLite
    /// memory connection is its own database.
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.into()))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, AppError> {
        Ok(self.pool.begin().await?)
    }

    /// Cheap liveness probe for the health endpoint.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

fn redact_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// One handle per entity repository, shared by the services.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub verification_codes: Arc<dyn VerificationCodeRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub profile_follows: Arc<dyn ProfileFollowRepository>,
    pub admin_users: Arc<dyn AdminUserRepository>,
    pub admin_sessions: Arc<dyn AdminSessionRepository>,
}

impl Repositories {
    /// SQL-backed repositories sharing `db`'s pool.
    pub fn sql(db: &Database) -> Self {
        let pool = db.pool().clone();
        Self {
            users: Arc::new(users::SqlUserRepository::new(pool.clone())),
            refresh_tokens: Arc::new(tokens::SqlRefreshTokenRepository::new(pool.clone())),
            verification_codes: Arc::new(tokens::SqlVerificationCodeRepository::new(
                pool.clone(),
            )),
            profiles: Arc::new(profiles::SqlProfileRepository::new(pool.clone())),
            profile_follows: Arc::new(profiles::SqlProfileFollowRepository::new(pool.clone())),
            admin_users: Arc::new(admin::SqlAdminUserRepository::new(pool.clone())),
            admin_sessions: Arc::new(admin::SqlAdminSessionRepository::new(pool)),
        }
    }
}
