// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, security, etc.).

pub mod admin_session;
pub mod auth;
pub mod security;

pub use admin_session::require_admin_session;
pub use auth::require_auth;
