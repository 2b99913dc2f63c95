// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only user queries.

use std::sync::Arc;

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::User;

/// Public view of a user.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub is_verified: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.display_name(),
            country: user.country.clone(),
            is_verified: user.is_verified,
        }
    }
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// All users with a usable display name.
    pub async fn list(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.users.list().await?;
        Ok(users
            .iter()
            .filter(|u| !u.first_name.trim().is_empty())
            .map(UserResponse::from)
            .collect())
    }

    pub async fn get(&self, id: i64) -> Result<UserResponse, AppError> {
        self.users
            .get_by_id(id)
            .await?
            .as_ref()
            .map(UserResponse::from)
            .ok_or_else(|| AppError::NotFound("user".to_string()))
    }
}
