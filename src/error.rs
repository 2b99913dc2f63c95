// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::response::ApiResponse;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("unauthorized request")]
    Unauthorized,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("refresh token expired")]
    TokenExpired,

    /// Shared by "no such account" and "wrong password" so the two are indistinguishable.
    #[error("invalid email or password")]
    InvalidEmailOrPassword,

    #[error("invalid request body")]
    InvalidRequestBody(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("nothing to update")]
    NothingToUpdate,

    #[error("verification code expired")]
    VerificationCodeExpired,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized
            | AppError::InvalidToken
            | AppError::TokenExpired
            | AppError::InvalidEmailOrPassword => StatusCode::UNAUTHORIZED,
            AppError::InvalidRequestBody(_)
            | AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::NothingToUpdate
            | AppError::VerificationCodeExpired => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequestBody(rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::InvalidRequestBody(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let codes: Vec<&str> = errs.iter().map(|e| e.code.as_ref()).collect();
                format!("{}: {}", field, codes.join(","))
            })
            .collect();
        fields.sort();
        AppError::Validation(format!("invalid fields: {}", fields.join("; ")))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(anyhow::anyhow!("password hashing failed: {}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::InvalidRequestBody(details) => {
                tracing::warn!(details = %details, "Rejected request body");
                self.to_string()
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                "internal server error".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
