// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification delivery contract.

use async_trait::async_trait;

use crate::error::MedvaultError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Notification;

/// Delivers a rendered notification.
///
/// Synchronous from the engine's point of view: the call returns once the
/// message was accepted or rejected. A returned error means the engine must
/// treat the transition as not having happened.
#[async_trait]
pub trait Notifier: PluginAdapter {
    async fn send(&self, notification: &Notification) -> Result<(), MedvaultError>;
}
