// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification templates and delivery for the Medvault reminder engine.

pub mod log;
pub mod smtp;
pub mod templates;

use std::sync::Arc;

use medvault_config::model::{NotifierBackend, NotifierConfig};
use medvault_core::{MedvaultError, Notifier};
use tracing::info;

pub use log::LogNotifier;
pub use smtp::SmtpNotifier;
pub use templates::Templates;

/// Build the notifier selected by `notifier.backend`.
pub fn build_notifier(config: &NotifierConfig) -> Result<Arc<dyn Notifier>, MedvaultError> {
    match config.backend {
        NotifierBackend::Log => {
            info!("notifier backend: log only, nothing will be delivered");
            Ok(Arc::new(LogNotifier::new()))
        }
        NotifierBackend::Smtp => {
            info!(host = %config.smtp_host, port = config.smtp_port, "notifier backend: smtp");
            Ok(Arc::new(SmtpNotifier::from_config(config)?))
        }
    }
}
