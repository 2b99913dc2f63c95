// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Ronin Fitness: backend API for the Ronin Fitness app
//!
//! This crate provides account registration and login with JWT access and
//! refresh tokens, email verification, profiles with a follow graph, and a
//! small session-authenticated admin CMS.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use db::{Database, Repositories};
use services::{
    AdminService, AuthService, EmailService, Mailer, ProfileService, TokenService, UserService,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub repos: Repositories,
    pub tokens: Arc<TokenService>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub profile_service: ProfileService,
    pub admin_service: AdminService,
}

impl AppState {
    /// Wire every service against `db`, sending email through `mailer`.
    pub fn new(config: Config, db: Database, mailer: Arc<dyn Mailer>) -> Self {
        let repos = Repositories::sql(&db);
        let tokens = Arc::new(TokenService::from_config(&config));
        let email = EmailService::new(mailer);

        Self {
            auth_service: AuthService::new(
                &config,
                db.clone(),
                repos.clone(),
                tokens.clone(),
                email,
            ),
            user_service: UserService::new(repos.users.clone()),
            profile_service: ProfileService::new(db.clone(), repos.clone()),
            admin_service: AdminService::new(&config, repos.clone()),
            config,
            db,
            repos,
            tokens,
        }
    }
}
