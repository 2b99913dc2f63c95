// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! bcrypt hashing, run off the async executor.
//!
//! bcrypt only reads the first 72 bytes of its input, so longer passwords are
//! refused rather than silently truncated.

use bcrypt::BcryptError;
use tokio::sync::OnceCell;
use validator::ValidationError;

use crate::error::AppError;

/// Longest password bcrypt can hash without truncation, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::non_truncating_hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

/// `Ok(false)` on mismatch or an over-long password; `Err` only when `hash`
/// is not a bcrypt hash.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let result = tokio::task::spawn_blocking(move || bcrypt::non_truncating_verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("hashing task failed: {}", e)))?;

    match result {
        Ok(matched) => Ok(matched),
        Err(BcryptError::Truncation(_)) => Ok(false),
        Err(e) => Err(AppError::from(e)),
    }
}

/// `validator` hook: reject passwords bcrypt would truncate.
pub fn password_fits_bcrypt(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::new("password_too_long"));
    }
    Ok(())
}

/// A throwaway bcrypt hash at the configured cost.
///
/// Logins for unknown accounts verify against it so they take as long as a
/// wrong password for a real one. Hashed on first use.
pub struct DummyHash {
    cost: u32,
    hash: OnceCell<String>,
}

impl DummyHash {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            hash: OnceCell::new(),
        }
    }

    /// Run a full bcrypt verification that never matches.
    pub async fn verify(&self, password: &str) -> Result<bool, AppError> {
        let hash = self
            .hash
            .get_or_try_init(|| hash_password("ronin-unused-password", self.cost))
            .await?;
        verify_password(password, hash).await?;
        Ok(false)
    }

    pub fn is_initialized(&self) -> bool {
        self.hash.initialized()
    }
}
