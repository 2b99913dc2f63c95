// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development. The JWT secret has no
//! fallback: the server refuses to start without one.

use std::env;
use std::str::FromStr;

use chrono::Duration;

/// Deployment environment, controls cookie security and email delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Local,
    Production,
}

impl FromStr for AppEnv {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "development" | "dev" => Ok(AppEnv::Local),
            "production" | "prod" => Ok(AppEnv::Production),
            _ => Err(ConfigError::Invalid("APP_ENV", s.to_string())),
        }
    }
}

/// Mailgun credentials. Email is only sent over the API when these are set.
#[derive(Debug, Clone)]
pub struct MailgunConfig {
    pub domain: String,
    pub api_key: String,
    pub api_base: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    pub app_env: AppEnv,
    /// sqlx connection string, e.g. `sqlite://ronin.db?mode=rwc`
    pub database_url: String,
    /// Origins allowed by CORS in addition to localhost
    pub allowed_origins: Vec<String>,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Only safe behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,

    /// HS256 signing secret for access and refresh tokens (raw bytes)
    pub jwt_secret: Vec<u8>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub verification_code_ttl: Duration,
    pub admin_session_ttl: Duration,
    /// bcrypt work factor
    pub bcrypt_cost: u32,

    /// Sender address for outgoing email
    pub from_email: String,
    pub mailgun: Option<MailgunConfig>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_secret = env::var("JWT_SECRET")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        let app_env = match env::var("APP_ENV") {
            Ok(v) => v.parse()?,
            Err(_) => AppEnv::Production,
        };

        let mailgun = match (env::var("MAILGUN_DOMAIN"), env::var("MAILGUN_API_KEY")) {
            (Ok(domain), Ok(api_key)) if !domain.is_empty() && !api_key.is_empty() => {
                Some(MailgunConfig {
                    domain,
                    api_key: api_key.trim().to_string(),
                    api_base: env::var("MAILGUN_API_BASE")
                        .unwrap_or_else(|_| "https://api.mailgun.net/v3".to_string()),
                })
            }
            _ => None,
        };

        Ok(Self {
            port: parse_or("PORT", 8080)?,
            app_env,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://ronin.db?mode=rwc".to_string()),
            allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            trust_proxy_headers: parse_or("TRUST_PROXY_HEADERS", false)?,

            jwt_secret: jwt_secret.into_bytes(),
            access_token_ttl: Duration::seconds(parse_or("ACCESS_TOKEN_TTL_SECS", 15 * 60)?),
            refresh_token_ttl: Duration::seconds(parse_or(
                "REFRESH_TOKEN_TTL_SECS",
                30 * 24 * 60 * 60,
            )?),
            verification_code_ttl: Duration::seconds(parse_or(
                "VERIFICATION_CODE_TTL_SECS",
                60 * 60,
            )?),
            admin_session_ttl: Duration::seconds(parse_or("ADMIN_SESSION_TTL_SECS", 12 * 60 * 60)?),
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,

            from_email: env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "no-reply@roninfitness.app".to_string()),
            mailgun,
        })
    }

    /// Configuration for tests: in-memory database, cheap bcrypt, no Mailgun.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            app_env: AppEnv::Local,
            database_url: "sqlite::memory:".to_string(),
            allowed_origins: vec!["http://localhost:5173".to_string()],
            trust_proxy_headers: true,
            jwt_secret: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(30),
            verification_code_ttl: Duration::hours(1),
            admin_session_ttl: Duration::hours(12),
            bcrypt_cost: 4,
            from_email: "no-reply@test.local".to_string(),
            mailgun: None,
        }
    }

    /// Cookies are only marked `Secure` outside local development.
    pub fn secure_cookies(&self) -> bool {
        self.app_env != AppEnv::Local
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
