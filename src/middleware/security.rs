// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security headers middleware.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";
/// The CMS login page needs inline styles and a same-origin form post.
const ADMIN_CSP: &str =
    "default-src 'none'; style-src 'unsafe-inline'; form-action 'self'; frame-ancestors 'none'";

/// Add security headers to all responses.
///
/// HSTS is only sent when cookies are secure, i.e. outside local development.
pub async fn add_security_headers(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let is_admin = req.uri().path().starts_with("/admin");
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    if state.config.secure_cookies() {
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static(if is_admin { ADMIN_CSP } else { API_CSP }),
    );
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppEnv, Config};
    use crate::db::Database;
    use crate::services::LogMailer;
    use axum::body::Body;
    use axum::{routing::get, Router};
    use tower::ServiceExt; // for oneshot

    async fn app(config: Config) -> Router {
        let db = Database::in_memory().await.unwrap();
        let state = Arc::new(AppState::new(config, db, Arc::new(LogMailer)));
        Router::new()
            .route("/", get(|| async { "Hello" }))
            .route("/admin/login", get(|| async { "Login" }))
            .layer(axum::middleware::from_fn_with_state(
                state,
                add_security_headers,
            ))
    }

    #[tokio::test]
    async fn test_security_headers() {
        let response = app(Config::test_default())
            .await
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();

        assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
        assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
        assert_eq!(headers.get("Content-Security-Policy").unwrap(), API_CSP);
        assert_eq!(headers.get("Referrer-Policy").unwrap(), "no-referrer");
        assert!(headers.get("Strict-Transport-Security").is_none());
    }

    #[tokio::test]
    async fn test_admin_csp_and_hsts_in_production() {
        let config = Config {
            app_env: AppEnv::Production,
            ..Config::test_default()
        };
        let response = app(config)
            .await
            .oneshot(
                Request::builder()
                    .uri("/admin/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers.get("Content-Security-Policy").unwrap(), ADMIN_CSP);
        assert_eq!(
            headers.get("Strict-Transport-Security").unwrap(),
            "max-age=31536000; includeSubDomains"
        );
    }
}
