// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CMS administrators and their cookie sessions.
//!
//! The session cookie carries 32 random bytes; only their SHA-256 is stored.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Serialize;

use crate::config::Config;
use crate::db::Repositories;
use crate::error::AppError;
use crate::models::{AdminUser, NewAdminUser};
use crate::services::auth::normalize_email;
use crate::services::password::{hash_password, verify_password, DummyHash};
use crate::services::tokens::hash_token;
use crate::services::users::UserResponse;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_users: i64,
    pub verified_users: i64,
    pub total_profiles: i64,
}

/// A freshly opened session. `token` goes in the cookie.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub token: String,
    pub admin: AdminUser,
}

pub struct AdminService {
    repos: Repositories,
    rng: SystemRandom,
    bcrypt_cost: u32,
    dummy_hash: DummyHash,
    session_ttl: Duration,
}

impl AdminService {
    pub fn new(config: &Config, repos: Repositories) -> Self {
        Self {
            repos,
            rng: SystemRandom::new(),
            bcrypt_cost: config.bcrypt_cost,
            dummy_hash: DummyHash::new(config.bcrypt_cost),
            session_ttl: config.admin_session_ttl,
        }
    }

    pub async fn create_admin(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<AdminUser, AppError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::BadRequest(
                "email and password are required".to_string(),
            ));
        }

        let admin = self
            .repos
            .admin_users
            .create(&NewAdminUser {
                first_name: first_name.trim().to_string(),
                last_name: last_name.trim().to_string(),
                email: normalize_email(email),
                password_hash: hash_password(password, self.bcrypt_cost).await?,
            })
            .await?;

        tracing::info!(admin_id = admin.id, "Admin user created");
        Ok(admin)
    }

    /// Check credentials and open a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<NewSession, AppError> {
        let admin = match self
            .repos
            .admin_users
            .get_by_email(&normalize_email(email))
            .await
        {
            Ok(Some(admin)) => admin,
            Ok(None) => {
                self.dummy_hash.verify(password).await?;
                return Err(AppError::InvalidEmailOrPassword);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Admin lookup failed during login");
                self.dummy_hash.verify(password).await?;
                return Err(AppError::InvalidEmailOrPassword);
            }
        };

        let matched = match verify_password(password, &admin.password).await {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!(
                    admin_id = admin.id,
                    error = %e,
                    "Stored admin password hash is unusable"
                );
                false
            }
        };
        if !matched {
            return Err(AppError::InvalidEmailOrPassword);
        }

        let token = self.random_token()?;
        self.repos
            .admin_sessions
            .create(admin.id, &hash_token(&token), Utc::now() + self.session_ttl)
            .await?;

        if let Err(e) = self.repos.admin_sessions.delete_expired(Utc::now()).await {
            tracing::warn!(error = %e, "Failed to prune expired admin sessions");
        }

        tracing::info!(admin_id = admin.id, "Admin logged in");
        Ok(NewSession { token, admin })
    }

    /// Admin behind a session cookie, if the session is live.
    pub async fn session_admin(&self, token: &str) -> Result<Option<AdminUser>, AppError> {
        let Some(session) = self
            .repos
            .admin_sessions
            .get_by_hash(&hash_token(token))
            .await?
        else {
            return Ok(None);
        };

        if session.expires_at <= Utc::now() {
            self.repos
                .admin_sessions
                .delete_by_hash(&session.token_hash)
                .await?;
            return Ok(None);
        }

        self.repos.admin_users.get_by_id(session.admin_user_id).await
    }

    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.repos
            .admin_sessions
            .delete_by_hash(&hash_token(token))
            .await?;
        Ok(())
    }

    pub async fn dashboard(&self) -> Result<DashboardStats, AppError> {
        Ok(DashboardStats {
            total_users: self.repos.users.count().await?,
            verified_users: self.repos.users.count_verified().await?,
            total_profiles: self.repos.profiles.count().await?,
        })
    }

    pub async fn users(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.repos.users.list().await?;
        Ok(users.iter().map(UserResponse::from).collect())
    }

    fn random_token(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; 32];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG failure")))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}
