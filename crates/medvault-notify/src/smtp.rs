// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP delivery through lettre's async transport.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, warn};

use medvault_config::model::NotifierConfig;
use medvault_core::types::Notification;
use medvault_core::{AdapterType, HealthStatus, MedvaultError, Notifier, PluginAdapter};

use crate::templates::{FIELD_ACTION_TEXT, FIELD_ACTION_URL, FIELD_CURRENT_YEAR, FIELD_FOOTER};

/// Sends each notification as a plain-text + HTML email.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Build the transport. No connection is made until the first send.
    pub fn from_config(config: &NotifierConfig) -> Result<Self, MedvaultError> {
        let address = config
            .from_address
            .as_deref()
            .ok_or_else(|| MedvaultError::Config("notifier.from_address is not set".into()))?;
        let from = Mailbox::new(
            Some(config.from_name.clone()),
            address
                .parse()
                .map_err(|e| MedvaultError::Config(format!("notifier.from_address: {e}")))?,
        );

        let builder = if config.smtp_implicit_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .map_err(|e| MedvaultError::Config(format!("notifier.smtp_host: {e}")))?;

        let mut builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));
        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        debug!(
            host = %config.smtp_host,
            port = config.smtp_port,
            implicit_tls = config.smtp_implicit_tls,
            "SMTP notifier configured"
        );
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, MedvaultError> {
        let to = Mailbox::new(
            Some(notification.recipient.name.clone()),
            notification.recipient.email.parse().map_err(|e| {
                MedvaultError::notify(
                    format!("invalid recipient `{}`", notification.recipient.email),
                    e,
                )
            })?,
        );
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&notification.subject)
            .multipart(MultiPart::alternative_plain_html(
                render_text(notification),
                render_html(notification),
            ))
            .map_err(|e| MedvaultError::notify("could not build email", e))
    }
}

#[async_trait]
impl PluginAdapter for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notifier
    }

    async fn health_check(&self) -> Result<HealthStatus, MedvaultError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(HealthStatus::Healthy),
            Ok(false) => Ok(HealthStatus::Degraded("SMTP server refused NOOP".into())),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), MedvaultError> {
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), MedvaultError> {
        let message = self.build_message(notification)?;
        match self.transport.send(message).await {
            Ok(response) => {
                debug!(
                    to = %notification.recipient.email,
                    subject = %notification.subject,
                    code = %response.code(),
                    "email sent"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    to = %notification.recipient.email,
                    subject = %notification.subject,
                    error = %e,
                    "email delivery failed"
                );
                Err(MedvaultError::notify("SMTP delivery failed", e))
            }
        }
    }
}

fn field<'a>(notification: &'a Notification, key: &str) -> Option<&'a str> {
    notification.fields.get(key).map(String::as_str)
}

/// Plain-text alternative.
pub fn render_text(n: &Notification) -> String {
    let mut out = n.body.clone();
    if let (Some(url), Some(text)) = (field(n, FIELD_ACTION_URL), field(n, FIELD_ACTION_TEXT)) {
        out.push_str(&format!("\n{text}: {url}\n"));
    }
    if let Some(footer) = field(n, FIELD_FOOTER) {
        out.push_str(&format!("\n{footer}\n"));
    }
    if let Some(year) = field(n, FIELD_CURRENT_YEAR) {
        out.push_str(&format!("\n© {year}\n"));
    }
    out
}

/// HTML alternative, rendered from Markdown by comrak.
///
/// Raw HTML in any field is omitted rather than passed through.
pub fn render_html(n: &Notification) -> String {
    let mut markdown = format!("## {}\n\n{}\n", n.subject, n.body);
    if let (Some(url), Some(text)) = (field(n, FIELD_ACTION_URL), field(n, FIELD_ACTION_TEXT)) {
        markdown.push_str(&format!("\n[{text}](<{url}>)\n"));
    }
    if let Some(footer) = field(n, FIELD_FOOTER) {
        markdown.push_str(&format!("\n---\n\n{footer}\n"));
    }
    if let Some(year) = field(n, FIELD_CURRENT_YEAR) {
        markdown.push_str(&format!("\n© {year}\n"));
    }

    let mut options = comrak::Options::default();
    options.render.hardbreaks = true;
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body>{}</body></html>",
        comrak::markdown_to_html(&markdown, &options)
    )
}
