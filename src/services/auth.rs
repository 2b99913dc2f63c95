// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account lifecycle: registration, login, token refresh, logout and email
//! verification.
//!
//! Multi-row writes run inside a single transaction that rolls back when
//! dropped, so a failure part way through registration leaves no rows behind.
//! Email is sent only after commit and never fails the request.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rand::{rng, seq::SliceRandom, Rng};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::SqliteConnection;
use validator::Validate;

use crate::config::Config;
use crate::db::{Database, Repositories};
use crate::error::AppError;
use crate::models::{user::format_display_name, NewProfile, NewRefreshToken, NewUser, NewVerificationCode};
use crate::services::email::EmailService;
use crate::services::password::{
    hash_password, password_fits_bcrypt, verify_password, DummyHash,
};
use crate::services::tokens::{hash_token, TokenService};
use crate::services::users::UserResponse;

/// Who is calling, recorded alongside each refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub user_agent: String,
    pub ip_address: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1), custom(function = "password_fits_bcrypt"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    /// `YYYY-MM-DD`
    #[serde(default)]
    #[validate(length(min = 1))]
    pub birthday: String,
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyAccountRequest {
    #[validate(range(min = 1))]
    pub user_id: i64,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    #[serde(rename = "token")]
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

pub struct AuthService {
    db: Database,
    repos: Repositories,
    tokens: Arc<TokenService>,
    email: EmailService,
    bcrypt_cost: u32,
    dummy_hash: DummyHash,
    verification_code_ttl: chrono::Duration,
}

impl AuthService {
    pub fn new(
        config: &Config,
        db: Database,
        repos: Repositories,
        tokens: Arc<TokenService>,
        email: EmailService,
    ) -> Self {
        Self {
            db,
            repos,
            tokens,
            email,
            bcrypt_cost: config.bcrypt_cost,
            dummy_hash: DummyHash::new(config.bcrypt_cost),
            verification_code_ttl: config.verification_code_ttl,
        }
    }

    pub async fn login(
        &self,
        req: &LoginRequest,
        client: &ClientInfo,
    ) -> Result<LoginResponse, AppError> {
        let email = normalize_email(&req.email);

        let user = match self.repos.users.get_by_email(&email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.dummy_hash.verify(&req.password).await?;
                return Err(AppError::InvalidEmailOrPassword);
            }
            Err(e) => {
                tracing::warn!(error = %e, "User lookup failed during login");
                self.dummy_hash.verify(&req.password).await?;
                return Err(AppError::InvalidEmailOrPassword);
            }
        };

        let matched = match verify_password(&req.password, &user.password).await {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!(
                    user_id = user.id,
                    error = %e,
                    "Stored password hash is unusable"
                );
                false
            }
        };
        if !matched {
            return Err(AppError::InvalidEmailOrPassword);
        }

        if let Err(e) = self
            .repos
            .refresh_tokens
            .delete_expired(Utc::now())
            .await
        {
            tracing::warn!(error = %e, "Failed to prune expired refresh tokens");
        }

        let mut tx = self.db.begin().await?;
        let tokens = self.create_tokens(&mut tx, user.id, client).await?;
        tx.commit().await?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(LoginResponse {
            user: UserResponse::from(&user),
            tokens,
        })
    }

    pub async fn register(
        &self,
        req: &RegisterRequest,
        client: &ClientInfo,
    ) -> Result<RegisterResponse, AppError> {
        let birthday = NaiveDate::parse_from_str(req.birthday.trim(), "%Y-%m-%d").map_err(|_| {
            AppError::Validation("invalid birthday, expected YYYY-MM-DD".to_string())
        })?;

        let new_user = NewUser {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            email: normalize_email(&req.email),
            password_hash: hash_password(&req.password, self.bcrypt_cost).await?,
            birthday,
            country: req.country.trim().to_string(),
        };

        let mut tx = self.db.begin().await?;

        let user = self.repos.users.create(&mut tx, &new_user).await?;

        self.repos
            .profiles
            .create(
                &mut tx,
                &NewProfile {
                    user_id: user.id,
                    display_name: format_display_name(&user.first_name, &user.last_name),
                },
            )
            .await?;

        let code = self
            .repos
            .verification_codes
            .create(
                &mut tx,
                &NewVerificationCode {
                    user_id: user.id,
                    email: user.email.clone(),
                    code: generate_verification_code(),
                    expires_at: Utc::now() + self.verification_code_ttl,
                },
            )
            .await?;

        let tokens = self.create_tokens(&mut tx, user.id, client).await?;

        tx.commit().await?;
        tracing::info!(user_id = user.id, "User registered");

        if let Err(e) = self
            .email
            .send_verification(&user.email, &user.first_name, &code.code, code.expires_at)
            .await
        {
            tracing::error!(
                user_id = user.id,
                email = %user.email,
                error = %e,
                "Failed to send verification email"
            );
        }

        Ok(RegisterResponse {
            user_id: user.id,
            tokens,
        })
    }

    /// New access token for a stored, unexpired refresh token. The refresh
    /// token itself is returned unchanged.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let record = self
            .repos
            .refresh_tokens
            .get_by_hash(&hash_token(refresh_token))
            .await?
            .ok_or_else(|| AppError::NotFound("refresh token".to_string()))?;

        if record.is_expired(Utc::now()) {
            return Err(AppError::TokenExpired);
        }

        Ok(TokenPair {
            access_token: self.tokens.mint_access(record.user_id)?,
            refresh_token: refresh_token.to_string(),
        })
    }

    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        let token_hash = hash_token(refresh_token);

        let record = match self.repos.refresh_tokens.get_by_hash(&token_hash).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(AppError::Unauthorized),
            Err(e) => {
                tracing::warn!(error = %e, "Refresh token lookup failed during logout");
                return Err(AppError::Unauthorized);
            }
        };

        self.repos.refresh_tokens.delete_by_hash(&token_hash).await?;
        tracing::info!(user_id = record.user_id, "User logged out");
        Ok(())
    }

    pub async fn verify_account(&self, req: &VerifyAccountRequest) -> Result<UserResponse, AppError> {
        let code = self
            .repos
            .verification_codes
            .get_by_code(req.code.trim(), req.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("verification code".to_string()))?;

        if code.is_expired(Utc::now()) {
            return Err(AppError::VerificationCodeExpired);
        }

        let mut user = self
            .repos
            .users
            .get_by_id(req.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user".to_string()))?;

        let mut tx = self.db.begin().await?;
        self.repos.users.mark_verified(&mut tx, user.id).await?;
        self.repos
            .verification_codes
            .delete_for_user(&mut tx, user.id)
            .await?;
        tx.commit().await?;

        user.is_verified = true;
        tracing::info!(user_id = user.id, "Account verified");

        if let Err(e) = self.email.send_welcome(&user.email, &user.first_name).await {
            tracing::error!(
                user_id = user.id,
                email = %user.email,
                error = %e,
                "Failed to send welcome email"
            );
        }

        Ok(UserResponse::from(&user))
    }

    async fn create_tokens(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        client: &ClientInfo,
    ) -> Result<TokenPair, AppError> {
        let issued = self.tokens.issue(user_id)?;

        self.repos
            .refresh_tokens
            .create(
                conn,
                &NewRefreshToken {
                    user_id,
                    token_hash: hash_token(&issued.refresh_token),
                    user_agent: client.user_agent.clone(),
                    ip_address: client.ip_address.clone(),
                    expires_at: issued.refresh_expires_at,
                },
            )
            .await?;

        Ok(TokenPair {
            access_token: issued.access_token,
            refresh_token: issued.refresh_token,
        })
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Three uppercase letters and two digits in random order, e.g. `K7QB2`.
pub fn generate_verification_code() -> String {
    const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    const DIGITS: &[u8] = b"0123456789";

    let mut rng = rng();
    let mut code = Vec::with_capacity(5);
    for _ in 0..3 {
        code.push(LETTERS[rng.random_range(0..LETTERS.len())]);
    }
    for _ in 0..2 {
        code.push(DIGITS[rng.random_range(0..DIGITS.len())]);
    }
    code.shuffle(&mut rng);

    code.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> AuthService {
        let config = Config::test_default();
        let db = Database::in_memory().await.unwrap();
        let repos = Repositories::sql(&db);
        let tokens = Arc::new(TokenService::from_config(&config));
        let email = EmailService::new(Arc::new(crate::services::LogMailer));
        AuthService::new(&config, db, repos, tokens, email)
    }

    fn client() -> ClientInfo {
        ClientInfo {
            user_agent: "ronin-tests/1.0".to_string(),
            ip_address: "203.0.113.7".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unknown_email_still_runs_bcrypt() {
        let service = service().await;
        assert!(!service.dummy_hash.is_initialized());

        let result = service
            .login(
                &LoginRequest {
                    email: "nobody@example.com".to_string(),
                    password: "correct horse battery".to_string(),
                },
                &client(),
            )
            .await;

        assert!(matches!(result, Err(AppError::InvalidEmailOrPassword)));
        assert!(service.dummy_hash.is_initialized());
    }

    #[tokio::test]
    async fn test_login_prunes_expired_refresh_tokens() {
        let service = service().await;
        let registered = service
            .register(
                &RegisterRequest {
                    first_name: "Ann".to_string(),
                    last_name: "Bower".to_string(),
                    email: "ann@example.com".to_string(),
                    password: "correct horse battery".to_string(),
                    country: "NZ".to_string(),
                    birthday: "1990-04-12".to_string(),
                },
                &client(),
            )
            .await
            .unwrap();

        sqlx::query("UPDATE refresh_tokens SET expires_at = ? WHERE user_id = ?")
            .bind(Utc::now() - chrono::Duration::minutes(1))
            .bind(registered.user_id)
            .execute(service.db.pool())
            .await
            .unwrap();

        let response = service
            .login(
                &LoginRequest {
                    email: "ann@example.com".to_string(),
                    password: "correct horse battery".to_string(),
                },
                &client(),
            )
            .await
            .unwrap();

        let remaining: Vec<String> = sqlx::query_scalar("SELECT token_hash FROM refresh_tokens")
            .fetch_all(service.db.pool())
            .await
            .unwrap();
        assert_eq!(remaining, vec![hash_token(&response.tokens.refresh_token)]);
    }

    #[test]
    fn test_verification_code_shape() {
        for _ in 0..100 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 5);
            assert_eq!(code.chars().filter(|c| c.is_ascii_uppercase()).count(), 3);
            assert_eq!(code.chars().filter(|c| c.is_ascii_digit()).count(), 2);
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ann@Example.COM "), "ann@example.com");
    }

    #[test]
    fn test_register_request_requires_fields() {
        let req: RegisterRequest = serde_json::from_str(r#"{"email": "a@b.com"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("first_name"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("birthday"));
        assert!(!fields.contains_key("email"));
    }

    #[test]
    fn test_register_email_is_trimmed_before_validation() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"first_name": "Ann", "last_name": "Bower", "email": " Ann@Example.com ",
                "password": "pw", "country": "NZ", "birthday": "1990-04-12"}"#,
        )
        .unwrap();
        assert_eq!(req.email, "Ann@Example.com");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_register_password_limit_is_in_bytes() {
        let mut req: RegisterRequest = serde_json::from_str(
            r#"{"first_name": "Ann", "last_name": "Bower", "email": "ann@example.com",
                "country": "NZ", "birthday": "1990-04-12"}"#,
        )
        .unwrap();
        req.password = "é".repeat(72);
        assert!(req.validate().unwrap_err().field_errors().contains_key("password"));

        req.password = "é".repeat(36);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_login_response_is_flat() {
        let response = LoginResponse {
            user: UserResponse {
                id: 1,
                name: "A.Bower".to_string(),
                country: "NZ".to_string(),
                is_verified: false,
            },
            tokens: TokenPair {
                access_token: "a".to_string(),
                refresh_token: "r".to_string(),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token"], "a");
        assert_eq!(json["refresh_token"], "r");
        assert_eq!(json["user"]["name"], "A.Bower");
    }
}
