// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cookie session gate for the admin CMS.

use crate::models::AdminUser;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

pub const ADMIN_SESSION_COOKIE: &str = "ronin_admin_session";

/// Admin behind the current session, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct CurrentAdmin(pub AdminUser);

/// Redirect to the login page unless the session cookie maps to a live session.
pub async fn require_admin_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(cookie) = jar.get(ADMIN_SESSION_COOKIE) else {
        return Redirect::to("/admin/login").into_response();
    };

    match state.admin_service.session_admin(cookie.value()).await {
        Ok(Some(admin)) => {
            request.extensions_mut().insert(CurrentAdmin(admin));
            next.run(request).await
        }
        Ok(None) => Redirect::to("/admin/login").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Admin session lookup failed");
            Redirect::to("/admin/login").into_response()
        }
    }
}
