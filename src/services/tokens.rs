// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT minting and verification for access and refresh tokens.
//!
//! Both token kinds are HS256 JWTs signed with the same secret and told apart
//! by the `typ` claim. Refresh tokens also carry a random `jti` so that two
//! tokens issued in the same second never collide in storage.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub typ: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub.parse().map_err(|_| AppError::InvalidToken)
    }
}

/// Freshly minted token pair.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        )
    }

    /// Mint an access/refresh pair for `user_id`.
    pub fn issue(&self, user_id: i64) -> Result<IssuedTokens, AppError> {
        let now = Utc::now();
        let refresh_expires_at = now + self.refresh_ttl;
        let refresh_claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: refresh_expires_at.timestamp(),
            typ: TokenKind::Refresh,
            jti: Some(uuid::Uuid::new_v4().to_string()),
        };

        Ok(IssuedTokens {
            access_token: self.mint_access(user_id)?,
            refresh_token: self.sign(&refresh_claims)?,
            refresh_expires_at,
        })
    }

    pub fn mint_access(&self, user_id: i64) -> Result<String, AppError> {
        let now = Utc::now();
        self.sign(&Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            typ: TokenKind::Access,
            jti: None,
        })
    }

    /// Check signature and expiry; refresh tokens are rejected.
    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AppError::InvalidToken)?;

        if data.claims.typ != TokenKind::Access {
            return Err(AppError::InvalidToken);
        }
        Ok(data.claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT encoding failed: {}", e)))
    }
}

/// Hex SHA-256 of an opaque token, the form in which tokens are stored.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
