// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifier that logs messages instead of delivering them.

use async_trait::async_trait;
use tracing::info;

use medvault_core::types::Notification;
use medvault_core::{AdapterType, HealthStatus, MedvaultError, Notifier, PluginAdapter};

/// Used when no SMTP relay is configured. Every send succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PluginAdapter for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notifier
    }

    async fn health_check(&self) -> Result<HealthStatus, MedvaultError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MedvaultError> {
        Ok(())
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), MedvaultError> {
        info!(
            to = %notification.recipient.email,
            subject = %notification.subject,
            kind = %notification.correlation.kind,
            entity_id = %notification.correlation.entity_id,
            slot = notification.correlation.slot.as_deref().unwrap_or("-"),
            "notification (log only)"
        );
        Ok(())
    }
}
