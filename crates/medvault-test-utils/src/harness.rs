// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness backed by a real SQLite database in a temp directory.
//!
//! `TestHarness` opens (and migrates) a fresh store, pairs it with a
//! [`RecordingNotifier`] and a [`FixedClock`], and offers seeding helpers.
//! Engines are built by the caller from the exposed parts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use medvault_config::model::MedvaultConfig;
use medvault_core::MedvaultError;
use medvault_core::types::{Appointment, Medication};
use medvault_notify::Templates;
use medvault_storage::{Doctor, SqliteStore, User};

use crate::clock::FixedClock;
use crate::recording_notifier::RecordingNotifier;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: MedvaultConfig,
    now: DateTime<Utc>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: MedvaultConfig::default(),
            now: Utc::now(),
        }
    }

    /// Start the clock at `now`.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Adjust the configuration before the store is opened.
    pub fn configure(mut self, f: impl FnOnce(&mut MedvaultConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub async fn build(mut self) -> Result<TestHarness, MedvaultError> {
        let temp_dir = tempfile::TempDir::new().map_err(MedvaultError::storage)?;
        let db_path = temp_dir.path().join("test.db");
        self.config.storage.database_path = db_path.to_string_lossy().to_string();

        let store = Arc::new(SqliteStore::open(&self.config.storage).await?);
        Ok(TestHarness {
            store,
            notifier: Arc::new(RecordingNotifier::new()),
            clock: Arc::new(FixedClock::new(self.now)),
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A migrated SQLite store plus deterministic collaborators.
pub struct TestHarness {
    pub store: Arc<SqliteStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
    pub config: MedvaultConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default configuration and the clock at `now`.
    pub async fn at(now: DateTime<Utc>) -> Result<Self, MedvaultError> {
        Self::builder().at(now).build().await
    }

    pub fn templates(&self) -> Templates {
        Templates::new(
            &self.config.notifier,
            self.config.scheduler.utc_offset_minutes,
        )
    }

    /// Insert a user whose address is `<name>@example.org`.
    pub async fn seed_user(&self, id: &str, name: &str) -> Result<(), MedvaultError> {
        self.store
            .insert_user(&User {
                id: id.to_string(),
                email: format!("{}@example.org", name.to_lowercase()),
                full_name: name.to_string(),
            })
            .await
    }

    pub async fn seed_doctor(&self, id: &str, name: &str) -> Result<(), MedvaultError> {
        self.store
            .insert_doctor(&Doctor {
                id: id.to_string(),
                email: format!("{id}@clinic.example.org"),
                full_name: name.to_string(),
                specialization: None,
            })
            .await
    }

    pub async fn seed_appointment(&self, appt: &Appointment) -> Result<(), MedvaultError> {
        self.store.insert_appointment(appt).await
    }

    pub async fn seed_medication(&self, med: &Medication) -> Result<(), MedvaultError> {
        self.store.insert_medication(med).await
    }
}
