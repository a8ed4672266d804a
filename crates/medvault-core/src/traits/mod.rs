// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Stores and notifiers extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` so the engines can hold them as trait objects.

pub mod adapter;
pub mod clock;
pub mod notifier;
pub mod storage;

pub use adapter::PluginAdapter;
pub use clock::{Clock, SystemClock};
pub use notifier::Notifier;
pub use storage::{AppointmentStore, MedicationStore};
