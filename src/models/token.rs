//! Refresh tokens and email verification codes.

use chrono::{DateTime, Utc};

/// A persisted refresh-token session. Only the SHA-256 of the token is stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub user_agent: String,
    pub ip_address: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub user_id: i64,
    pub token_hash: String,
    pub user_agent: String,
    pub ip_address: String,
    pub expires_at: DateTime<Utc>,
}

/// Short code emailed at registration to confirm account ownership.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerificationCode {
    pub id: i64,
    pub user_id: i64,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone)]
pub struct NewVerificationCode {
    pub user_id: i64,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}
