// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod admin;
pub mod profile;
pub mod token;
pub mod user;

pub use admin::{AdminSession, AdminUser, NewAdminUser};
pub use profile::{NewProfile, Privacy, Profile, ProfileChanges, ProfileFollow, ProfileWithUser};
pub use token::{NewRefreshToken, NewVerificationCode, RefreshToken, VerificationCode};
pub use user::{NewUser, User};
