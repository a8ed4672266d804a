// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence contracts consumed by the engines and the join endpoint.

use async_trait::async_trait;

use crate::error::MedvaultError;
use crate::filter::{AppointmentFilter, MedicationFilter};
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Appointment, AppointmentCandidate, AppointmentStatus, MedicationCandidate, MedicationUpdate,
};

/// Appointment persistence.
///
/// Status writes are compare-and-set: they only apply while the row still
/// holds the expected source status.
#[async_trait]
pub trait AppointmentStore: PluginAdapter {
    /// Rows matching `filter`, joined with recipient and doctor details.
    async fn appointment_candidates(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentCandidate>, MedvaultError>;

    async fn get_appointment(&self, id: &str) -> Result<Option<Appointment>, MedvaultError>;

    /// Move `id` from `from` to `to` in its own transaction.
    ///
    /// Returns `Ok(false)` when the row no longer holds `from` (or is gone).
    async fn transition_appointment(
        &self,
        id: &str,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<bool, MedvaultError>;
}

/// Medication persistence.
#[async_trait]
pub trait MedicationStore: PluginAdapter {
    async fn medication_candidates(
        &self,
        filter: &MedicationFilter,
    ) -> Result<Vec<MedicationCandidate>, MedvaultError>;

    /// Apply `update` in its own transaction.
    ///
    /// Returns `Ok(false)` when `count_left` no longer equals
    /// `update.expected_count_left`.
    async fn commit_medication(&self, update: &MedicationUpdate) -> Result<bool, MedvaultError>;
}
