// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persist warnings and errors to the `logs` table.
//!
//! [`DbLogLayer`] is a `tracing_subscriber` layer that captures WARN and ERROR
//! events together with the fields of their enclosing spans (the request span
//! carries method, path, user agent and client IP). Records are handed to a
//! background writer over a channel so logging never waits on the database.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: String,
    pub message: String,
    pub context: Value,
    pub created_at: DateTime<Utc>,
}

pub struct DbLogLayer {
    tx: UnboundedSender<LogRecord>,
}

impl DbLogLayer {
    pub fn new() -> (Self, UnboundedReceiver<LogRecord>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

/// Fields recorded on a span, stashed in its extensions.
struct SpanFields(Map<String, Value>);

#[derive(Default)]
struct JsonVisitor(Map<String, Value>);

impl Visit for JsonVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0
            .insert(field.name().to_string(), Value::from(format!("{:?}", value)));
    }
}

fn is_own_event(target: &str) -> bool {
    target.starts_with("sqlx") || target == module_path!()
}

impl<S> Layer<S> for DbLogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = JsonVisitor::default();
        attrs.record(&mut visitor);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(visitor.0));
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = JsonVisitor::default();
        values.record(&mut visitor);

        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFields>() {
            Some(fields) => fields.0.extend(visitor.0),
            None => extensions.insert(SpanFields(visitor.0)),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        // More verbose levels compare greater.
        if *meta.level() > Level::WARN || is_own_event(meta.target()) {
            return;
        }

        let mut context = Map::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<SpanFields>() {
                    context.extend(fields.0.clone());
                }
            }
        }

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);
        let message = match visitor.0.remove("message") {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        context.extend(visitor.0);
        context.insert("target".to_string(), Value::from(meta.target()));

        // A closed channel just means the writer has shut down.
        let _ = self.tx.send(LogRecord {
            level: meta.level().to_string(),
            message,
            context: Value::Object(context),
            created_at: Utc::now(),
        });
    }
}

pub async fn write_record(pool: &SqlitePool, record: &LogRecord) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO logs (level, message, context, created_at) VALUES (?, ?, ?, ?)")
        .bind(&record.level)
        .bind(&record.message)
        .bind(record.context.to_string())
        .bind(record.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Drain `rx` into the database until every sender is dropped.
pub fn spawn_log_writer(
    pool: SqlitePool,
    mut rx: UnboundedReceiver<LogRecord>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(record) = rx.recv().await {
            if let Err(e) = write_record(&pool, &record).await {
                // Filtered out by the layer itself, so this cannot loop.
                tracing::warn!(error = %e, "Failed to persist log record");
            }
        }
    })
}
