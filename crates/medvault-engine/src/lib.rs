// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status-transition engines for appointments and medication courses.
//!
//! [`AppointmentEngine`] and [`MedicationEngine`] each evaluate one pass
//! against a single `now`; the [`Scheduler`] drives them on their own
//! intervals. Every notifying transition sends first and commits second
//! with a compare-and-set, so delivery is at least once and a row is never
//! advanced without its notice.

pub mod appointment;
pub mod medication;
pub mod report;
pub mod scheduler;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use medvault_config::model::MedvaultConfig;
use medvault_core::{AppointmentStore, Clock, MedicationStore, Notifier};
use medvault_notify::Templates;

pub use appointment::{AppointmentEngine, AppointmentRules, join_appointment, next_transition};
pub use medication::{MedicationEngine, MedicationRules};
pub use report::{PassKind, PassReport, RowFailure, RowOutcome, RowReport};
pub use scheduler::{Pass, Scheduler};

/// Wire both engines into a scheduler using the intervals from `config`.
pub fn build_scheduler<S>(
    config: &MedvaultConfig,
    store: Arc<S>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
) -> Scheduler
where
    S: AppointmentStore + MedicationStore,
{
    let templates = Templates::new(&config.notifier, config.scheduler.utc_offset_minutes);
    let appointments = AppointmentEngine::new(
        store.clone(),
        notifier.clone(),
        templates.clone(),
        AppointmentRules::from_config(&config.scheduler),
    );
    let medications = MedicationEngine::new(
        store,
        notifier,
        templates,
        MedicationRules::from_config(&config.scheduler),
    );

    Scheduler::new(clock)
        .with_pass(
            Arc::new(appointments),
            Duration::from_secs(config.scheduler.appointments_interval_secs),
        )
        .with_pass(
            Arc::new(medications),
            Duration::from_secs(config.scheduler.medications_interval_secs),
        )
}
