// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin CMS routes.
//!
//! Login is a plain HTML form; everything behind it returns JSON and requires
//! the session cookie set on successful login.

use axum::{
    extract::{rejection::FormRejection, State},
    middleware,
    response::{Html, Redirect},
    routing::get,
    Extension, Form, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::admin_session::{require_admin_session, CurrentAdmin, ADMIN_SESSION_COOKIE};
use crate::models::AdminUser;
use crate::response::ApiResponse;
use crate::services::admin::DashboardStats;
use crate::services::users::UserResponse;
use crate::AppState;

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Ronin Fitness Admin</title>
<style>
body { font-family: sans-serif; max-width: 22rem; margin: 4rem auto; }
label, input, button { display: block; width: 100%; margin-bottom: 0.75rem; }
</style>
</head>
<body>
<h1>Ronin Fitness Admin</h1>
<form method="post" action="/admin/login">
<label>Email <input type="email" name="email" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Sign in</button>
</form>
</body>
</html>
"#;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/users", get(users))
        .route_layer(middleware::from_fn_with_state(state, require_admin_session));

    Router::new()
        .route("/admin/login", get(login_page).post(login))
        .route("/admin/logout", get(logout))
        .merge(protected)
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub admin: AdminUser,
    pub stats: DashboardStats,
}

async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    form: std::result::Result<Form<AdminLoginForm>, FormRejection>,
) -> Result<(CookieJar, Redirect)> {
    let Form(form) = form?;
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Err(AppError::BadRequest(
            "email and password are required".to_string(),
        ));
    }

    let session = state
        .admin_service
        .login(&form.email, &form.password)
        .await?;

    let cookie = Cookie::build((ADMIN_SESSION_COOKIE, session.token))
        .path("/admin")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.secure_cookies())
        .max_age(time::Duration::seconds(
            state.config.admin_session_ttl.num_seconds(),
        ));

    Ok((jar.add(cookie), Redirect::to("/admin/dashboard")))
}

async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(ADMIN_SESSION_COOKIE) {
        if let Err(e) = state.admin_service.logout(cookie.value()).await {
            tracing::error!(error = %e, "Failed to delete admin session");
        }
    }

    let jar = jar.remove(Cookie::build(ADMIN_SESSION_COOKIE).path("/admin"));
    (jar, Redirect::to("/admin/login"))
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAdmin(admin)): Extension<CurrentAdmin>,
) -> Result<Json<ApiResponse<DashboardResponse>>> {
    let stats = state.admin_service.dashboard().await?;
    Ok(ApiResponse::ok(DashboardResponse { admin, stats }))
}

async fn users(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<Vec<UserResponse>>>> {
    Ok(ApiResponse::ok(state.admin_service.users().await?))
}
