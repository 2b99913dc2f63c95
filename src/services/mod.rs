// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod admin;
pub mod auth;
pub mod email;
pub mod password;
pub mod profiles;
pub mod tokens;
pub mod users;

pub use admin::AdminService;
pub use auth::{AuthService, ClientInfo};
pub use email::{EmailService, LogMailer, MailgunMailer, Mailer};
pub use profiles::ProfileService;
pub use tokens::TokenService;
pub use users::UserService;
