// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
};
use ronin_fitness::config::Config;
use ronin_fitness::db::Database;
use ronin_fitness::routes::create_router;
use ronin_fitness::services::email::{EmailMessage, Mailer};
use ronin_fitness::AppState;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Captures outgoing email instead of sending it.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[allow(dead_code)]
impl RecordingMailer {
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Always fails, like an unreachable mail provider.
#[allow(dead_code)]
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: &EmailMessage) -> anyhow::Result<()> {
        anyhow::bail!("mail provider unavailable")
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub mailer: Arc<RecordingMailer>,
}

/// Create a test app backed by a fresh in-memory database.
/// Returns the router, the shared state and the mailer.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    let mailer = Arc::new(RecordingMailer::default());
    let (router, state) = create_test_app_with_mailer(mailer.clone()).await;
    TestApp {
        router,
        state,
        mailer,
    }
}

#[allow(dead_code)]
pub async fn create_test_app_with_mailer(
    mailer: Arc<dyn Mailer>,
) -> (axum::Router, Arc<AppState>) {
    build(Config::test_default(), mailer).await
}

/// Like `create_test_app`, with a caller-adjusted configuration.
#[allow(dead_code)]
pub async fn create_test_app_with_config(config: Config) -> TestApp {
    let mailer = Arc::new(RecordingMailer::default());
    let (router, state) = build(config, mailer.clone()).await;
    TestApp {
        router,
        state,
        mailer,
    }
}

async fn build(config: Config, mailer: Arc<dyn Mailer>) -> (axum::Router, Arc<AppState>) {
    let db = Database::in_memory()
        .await
        .expect("Failed to create in-memory database");
    let state = Arc::new(AppState::new(config, db, mailer));
    (create_router(state.clone()), state)
}

#[allow(dead_code)]
impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a JSON request, optionally with a bearer token.
    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (axum::http::StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, "ronin-tests/1.0")
            .header("X-Forwarded-For", "203.0.113.7");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.send(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    /// Register a user and return `(user_id, access_token, refresh_token)`.
    pub async fn register(&self, first_name: &str, email: &str) -> (i64, String, String) {
        let (status, body) = self
            .json(
                "POST",
                "/api/auth/register",
                Some(register_body(first_name, email)),
                None,
            )
            .await;
        assert_eq!(status, axum::http::StatusCode::CREATED, "{body}");
        let data = &body["data"];
        (
            data["user_id"].as_i64().unwrap(),
            data["token"].as_str().unwrap().to_string(),
            data["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.state.db.pool())
            .await
            .unwrap()
    }
}

#[allow(dead_code)]
pub fn register_body(first_name: &str, email: &str) -> Value {
    serde_json::json!({
        "first_name": first_name,
        "last_name": "Bower",
        "email": email,
        "password": "correct horse battery",
        "country": "NZ",
        "birthday": "1990-04-12",
    })
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
