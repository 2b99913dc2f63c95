// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outgoing transactional email.
//!
//! Messages go out through the Mailgun HTTP API when it is configured and are
//! only logged otherwise. Callers treat delivery as best-effort.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::{Config, MailgunConfig};
use crate::time_utils::format_utc_rfc3339;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivery backend.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()>;
}

/// Mailgun `messages` endpoint client.
pub struct MailgunMailer {
    http: reqwest::Client,
    config: MailgunConfig,
    from: String,
}

impl MailgunMailer {
    pub fn new(config: MailgunConfig, from: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build Mailgun HTTP client")?;
        Ok(Self { http, config, from })
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        let url = format!(
            "{}/{}/messages",
            self.config.api_base.trim_end_matches('/'),
            self.config.domain
        );

        let form = [
            ("from", self.from.as_str()),
            ("to", message.to.as_str()),
            ("subject", message.subject.as_str()),
            ("html", message.html.as_str()),
        ];

        let response = self
            .http
            .post(&url)
            .basic_auth("api", Some(&self.config.api_key))
            .form(&form)
            .send()
            .await
            .context("Mailgun request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Mailgun returned HTTP {}: {}", status, body);
        }

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}

/// Logs messages instead of sending them. Used when Mailgun is not configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.html,
            "Email delivery disabled, logging message"
        );
        Ok(())
    }
}

/// Pick the mailer for this deployment.
pub fn mailer_from_config(config: &Config) -> anyhow::Result<std::sync::Arc<dyn Mailer>> {
    match &config.mailgun {
        Some(mailgun) => Ok(std::sync::Arc::new(MailgunMailer::new(
            mailgun.clone(),
            config.from_email.clone(),
        )?)),
        None => Ok(std::sync::Arc::new(LogMailer)),
    }
}

/// Builds the app's emails and hands them to a [`Mailer`].
#[derive(Clone)]
pub struct EmailService {
    mailer: std::sync::Arc<dyn Mailer>,
}

impl EmailService {
    pub fn new(mailer: std::sync::Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    pub async fn send_verification(
        &self,
        to: &str,
        first_name: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let html = format!(
            "<p>Hi {},</p>\
             <p>Your Ronin Fitness verification code is <strong>{}</strong>.</p>\
             <p>It expires at {}.</p>",
            escape_html(first_name),
            escape_html(code),
            format_utc_rfc3339(expires_at),
        );
        self.mailer
            .send(&EmailMessage {
                to: to.to_string(),
                subject: "Account Verification - Ronin Fitness".to_string(),
                html,
            })
            .await
    }

    pub async fn send_welcome(&self, to: &str, first_name: &str) -> anyhow::Result<()> {
        let html = format!(
            "<p>Hi {},</p><p>Your account is verified. Welcome to Ronin Fitness!</p>",
            escape_html(first_name),
        );
        self.mailer
            .send(&EmailMessage {
                to: to.to_string(),
                subject: "Welcome to Ronin Fitness!".to_string(),
                html,
            })
            .await
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
