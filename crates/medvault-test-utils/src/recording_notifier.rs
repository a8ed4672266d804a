// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifier that records what it was asked to deliver.
//!
//! Failures can be scripted per call count, per kind or per recipient so
//! tests can exercise the "send failed, do not commit" paths.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use medvault_core::types::{Notification, NotificationKind};
use medvault_core::{AdapterType, HealthStatus, MedvaultError, Notifier, PluginAdapter};

#[derive(Default)]
struct State {
    sent: Vec<Notification>,
    attempts: usize,
    fail_next: usize,
    failing_kinds: HashSet<NotificationKind>,
    failing_recipients: HashSet<String>,
}

#[derive(Default)]
pub struct RecordingNotifier {
    state: Mutex<State>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications that were accepted, in send order.
    pub async fn sent(&self) -> Vec<Notification> {
        self.state.lock().await.sent.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.state.lock().await.sent.len()
    }

    /// Accepted notifications of `kind`.
    pub async fn sent_of(&self, kind: NotificationKind) -> Vec<Notification> {
        self.state
            .lock()
            .await
            .sent
            .iter()
            .filter(|n| n.correlation.kind == kind)
            .cloned()
            .collect()
    }

    /// Every call to `send`, accepted or not.
    pub async fn attempts(&self) -> usize {
        self.state.lock().await.attempts
    }

    pub async fn clear_sent(&self) {
        self.state.lock().await.sent.clear();
    }

    /// Reject the next `n` sends regardless of content.
    pub async fn fail_next(&self, n: usize) {
        self.state.lock().await.fail_next = n;
    }

    /// Reject every send of `kind` until [`clear_failures`](Self::clear_failures).
    pub async fn fail_kind(&self, kind: NotificationKind) {
        self.state.lock().await.failing_kinds.insert(kind);
    }

    /// Reject every send addressed to `email`.
    pub async fn fail_recipient(&self, email: impl Into<String>) {
        self.state
            .lock()
            .await
            .failing_recipients
            .insert(email.into());
    }

    pub async fn clear_failures(&self) {
        let mut state = self.state.lock().await;
        state.fail_next = 0;
        state.failing_kinds.clear();
        state.failing_recipients.clear();
    }
}

#[async_trait]
impl PluginAdapter for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
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
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), MedvaultError> {
        let mut state = self.state.lock().await;
        state.attempts += 1;

        let scripted = if state.fail_next > 0 {
            state.fail_next -= 1;
            true
        } else {
            false
        };
        if scripted
            || state.failing_kinds.contains(&notification.correlation.kind)
            || state
                .failing_recipients
                .contains(&notification.recipient.email)
        {
            return Err(MedvaultError::Notify {
                message: format!(
                    "scripted failure for {} ({})",
                    notification.recipient.email, notification.correlation.kind
                ),
                source: None,
            });
        }

        state.sent.push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::recipient;
    use medvault_core::types::Correlation;

    fn notification(kind: NotificationKind, to: &str) -> Notification {
        Notification {
            recipient: recipient(to),
            subject: "s".into(),
            body: String::new(),
            fields: Default::default(),
            correlation: Correlation {
                entity_id: "x".into(),
                kind,
                slot: None,
            },
        }
    }

    #[tokio::test]
    async fn records_accepted_sends() {
        let n = RecordingNotifier::new();
        n.send(&notification(NotificationKind::DoseDue, "Ada")).await.unwrap();
        assert_eq!(n.sent_count().await, 1);
        assert_eq!(n.sent_of(NotificationKind::DoseDue).await.len(), 1);
        assert!(n.sent_of(NotificationKind::CourseCompleted).await.is_empty());
    }

    #[tokio::test]
    async fn scripted_failures() {
        let n = RecordingNotifier::new();
        n.fail_next(1).await;
        assert!(n.send(&notification(NotificationKind::DoseDue, "Ada")).await.is_err());
        assert!(n.send(&notification(NotificationKind::DoseDue, "Ada")).await.is_ok());

        n.fail_kind(NotificationKind::AppointmentMissed).await;
        n.fail_recipient("bob@example.org").await;
        assert!(n.send(&notification(NotificationKind::AppointmentMissed, "Ada")).await.is_err());
        assert!(n.send(&notification(NotificationKind::DoseDue, "Bob")).await.is_err());

        n.clear_failures().await;
        assert!(n.send(&notification(NotificationKind::DoseDue, "Bob")).await.is_ok());
        assert_eq!(n.attempts().await, 6);
        assert_eq!(n.sent_count().await, 3);
    }
}
