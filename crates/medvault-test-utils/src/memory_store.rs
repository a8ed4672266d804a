// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementation of both stores.
//!
//! Rows are kept in insertion order so candidate lists are deterministic.
//! Guarded writes behave like the SQLite store's compare-and-set.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use medvault_core::filter::{AppointmentFilter, MedicationFilter};
use medvault_core::types::{
    Appointment, AppointmentCandidate, AppointmentStatus, Medication, MedicationCandidate,
    MedicationUpdate, Recipient,
};
use medvault_core::{
    AdapterType, AppointmentStore, HealthStatus, MedicationStore, MedvaultError, PluginAdapter,
};

#[derive(Default)]
struct Tables {
    users: HashMap<String, Recipient>,
    doctors: HashMap<String, String>,
    appointments: Vec<Appointment>,
    medications: Vec<Medication>,
    fail_reads: bool,
    fail_writes: bool,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, id: &str, recipient: Recipient) {
        self.tables
            .lock()
            .await
            .users
            .insert(id.to_string(), recipient);
    }

    pub async fn add_doctor(&self, id: &str, full_name: &str) {
        self.tables
            .lock()
            .await
            .doctors
            .insert(id.to_string(), full_name.to_string());
    }

    pub async fn add_appointment(&self, appt: Appointment) {
        self.tables.lock().await.appointments.push(appt);
    }

    pub async fn add_medication(&self, med: Medication) {
        self.tables.lock().await.medications.push(med);
    }

    pub async fn appointment(&self, id: &str) -> Option<Appointment> {
        self.tables
            .lock()
            .await
            .appointments
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub async fn medication(&self, id: &str) -> Option<Medication> {
        self.tables
            .lock()
            .await
            .medications
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    /// Unconditional status write, standing in for an outside actor.
    pub async fn set_appointment_status(&self, id: &str, status: AppointmentStatus) {
        if let Some(a) = self
            .tables
            .lock()
            .await
            .appointments
            .iter_mut()
            .find(|a| a.id == id)
        {
            a.status = status;
        }
    }

    /// Overwrite a medication row, standing in for an outside actor.
    pub async fn replace_medication(&self, med: Medication) {
        let mut tables = self.tables.lock().await;
        if let Some(slot) = tables.medications.iter_mut().find(|m| m.id == med.id) {
            *slot = med;
        }
    }

    /// Make candidate queries fail.
    pub async fn fail_reads(&self, fail: bool) {
        self.tables.lock().await.fail_reads = fail;
    }

    /// Make guarded writes fail.
    pub async fn fail_writes(&self, fail: bool) {
        self.tables.lock().await.fail_writes = fail;
    }
}

fn unavailable() -> MedvaultError {
    MedvaultError::storage(std::io::Error::other("in-memory store unavailable"))
}

fn missing_user(user_id: &str) -> Recipient {
    Recipient {
        email: String::new(),
        name: user_id.to_string(),
    }
}

#[async_trait]
impl PluginAdapter for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, MedvaultError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MedvaultError> {
        Ok(())
    }
}

#[async_trait]
impl AppointmentStore for InMemoryStore {
    async fn appointment_candidates(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentCandidate>, MedvaultError> {
        let tables = self.tables.lock().await;
        if tables.fail_reads {
            return Err(unavailable());
        }
        Ok(tables
            .appointments
            .iter()
            .filter(|a| filter.matches(a))
            .map(|a| AppointmentCandidate {
                appointment: a.clone(),
                recipient: tables
                    .users
                    .get(&a.user_id)
                    .cloned()
                    .unwrap_or_else(|| missing_user(&a.user_id)),
                doctor_name: a
                    .doctor_id
                    .as_ref()
                    .and_then(|d| tables.doctors.get(d))
                    .cloned(),
            })
            .collect())
    }

    async fn get_appointment(&self, id: &str) -> Result<Option<Appointment>, MedvaultError> {
        let tables = self.tables.lock().await;
        if tables.fail_reads {
            return Err(unavailable());
        }
        Ok(tables.appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn transition_appointment(
        &self,
        id: &str,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<bool, MedvaultError> {
        let mut tables = self.tables.lock().await;
        if tables.fail_writes {
            return Err(unavailable());
        }
        match tables
            .appointments
            .iter_mut()
            .find(|a| a.id == id && a.status == from)
        {
            Some(a) => {
                a.status = to;
                a.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl MedicationStore for InMemoryStore {
    async fn medication_candidates(
        &self,
        filter: &MedicationFilter,
    ) -> Result<Vec<MedicationCandidate>, MedvaultError> {
        let tables = self.tables.lock().await;
        if tables.fail_reads {
            return Err(unavailable());
        }
        Ok(tables
            .medications
            .iter()
            .filter(|m| filter.matches(m))
            .map(|m| MedicationCandidate {
                medication: m.clone(),
                recipient: tables
                    .users
                    .get(&m.user_id)
                    .cloned()
                    .unwrap_or_else(|| missing_user(&m.user_id)),
            })
            .collect())
    }

    async fn commit_medication(&self, update: &MedicationUpdate) -> Result<bool, MedvaultError> {
        let mut tables = self.tables.lock().await;
        if tables.fail_writes {
            return Err(unavailable());
        }
        match tables
            .medications
            .iter_mut()
            .find(|m| m.id == update.id && m.count_left == update.expected_count_left)
        {
            Some(m) => {
                m.count_left = update.count_left;
                m.status = update.status;
                m.last_sent_period = update.last_sent_period;
                m.last_sent_on = update.last_sent_on;
                m.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
