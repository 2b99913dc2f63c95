// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ronin Fitness API Server
//!
//! Serves the mobile app's JSON API and the admin CMS.

use anyhow::Context;
use ronin_fitness::{
    config::Config,
    db::Database,
    logging::{spawn_log_writer, DbLogLayer, LogRecord},
    services::email::mailer_from_config,
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging; warnings and errors also go to the DB
    let log_records = init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, env = ?config.app_env, "Starting Ronin Fitness API");

    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    spawn_log_writer(db.pool().clone(), log_records);

    let mailer = mailer_from_config(&config)?;
    if config.mailgun.is_none() {
        tracing::warn!("Mailgun not configured, emails will only be logged");
    }

    let port = config.port;
    let state = Arc::new(AppState::new(config, db, mailer));

    // Build router
    let app = ronin_fitness::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<UnboundedReceiver<LogRecord>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let (db_layer, records) = DbLogLayer::new();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ronin_fitness=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .with(db_layer)
        .try_init()?;

    Ok(records)
}
