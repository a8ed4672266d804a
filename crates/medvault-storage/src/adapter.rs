// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the appointment and medication stores.

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use medvault_config::model::StorageConfig;
use medvault_core::filter::{AppointmentFilter, MedicationFilter};
use medvault_core::types::{
    Appointment, AppointmentCandidate, AppointmentStatus, Medication, MedicationCandidate,
    MedicationUpdate,
};
use medvault_core::{
    AdapterType, AppointmentStore, HealthStatus, MedicationStore, MedvaultError, PluginAdapter,
};

use crate::database::{self, Database, map_tr_err};
use crate::models::{Doctor, User};
use crate::queries;

/// SQLite-backed store for both engines and the join endpoint.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open (and migrate) the configured database.
    pub async fn open(config: &StorageConfig) -> Result<Self, MedvaultError> {
        let db = Database::open_with(config).await?;
        debug!(path = %config.database_path, "SQLite store ready");
        Ok(Self::new(db))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn insert_user(&self, user: &User) -> Result<(), MedvaultError> {
        queries::users::insert_user(&self.db, user).await
    }

    pub async fn insert_doctor(&self, doctor: &Doctor) -> Result<(), MedvaultError> {
        queries::users::insert_doctor(&self.db, doctor).await
    }

    pub async fn insert_appointment(&self, appt: &Appointment) -> Result<(), MedvaultError> {
        queries::appointments::insert_appointment(&self.db, appt).await
    }

    pub async fn insert_medication(&self, med: &Medication) -> Result<(), MedvaultError> {
        queries::medications::insert_medication(&self.db, med).await
    }

    pub async fn get_medication(&self, id: &str) -> Result<Option<Medication>, MedvaultError> {
        queries::medications::get_medication(&self.db, id).await
    }

    pub async fn set_raw_schedule(&self, id: &str, raw: &str) -> Result<(), MedvaultError> {
        queries::medications::set_raw_schedule(&self.db, id, raw).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, MedvaultError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MedvaultError> {
        database::checkpoint(self.db.connection()).await?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl AppointmentStore for SqliteStore {
    async fn appointment_candidates(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentCandidate>, MedvaultError> {
        queries::appointments::candidates(&self.db, filter).await
    }

    async fn get_appointment(&self, id: &str) -> Result<Option<Appointment>, MedvaultError> {
        queries::appointments::get_appointment(&self.db, id).await
    }

    async fn transition_appointment(
        &self,
        id: &str,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<bool, MedvaultError> {
        queries::appointments::transition(&self.db, id, from, to, Utc::now()).await
    }
}

#[async_trait]
impl MedicationStore for SqliteStore {
    async fn medication_candidates(
        &self,
        filter: &MedicationFilter,
    ) -> Result<Vec<MedicationCandidate>, MedvaultError> {
        queries::medications::candidates(&self.db, filter).await
    }

    async fn commit_medication(&self, update: &MedicationUpdate) -> Result<bool, MedvaultError> {
        queries::medications::commit(&self.db, update, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            ..StorageConfig::default()
        }
    }

    #[tokio::test]
    async fn sqlite_store_identifies_itself() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteStore::open(&make_config(db_path.to_str().unwrap()))
            .await
            .unwrap();

        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
        assert_eq!(store.adapter_type(), AdapterType::Storage);
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        assert!(db_path.exists(), "database file should be created");
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn cancel_removes_row_from_engine_candidates() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&make_config(dir.path().join("t.db").to_str().unwrap()))
            .await
            .unwrap();
        store
            .insert_user(&User {
                id: "u1".into(),
                email: "ada@example.org".into(),
                full_name: "Ada".into(),
            })
            .await
            .unwrap();
        let start = Utc::now();
        let appt = Appointment::new("u1", None, start, start + chrono::Duration::hours(1), None)
            .unwrap();
        store.insert_appointment(&appt).await.unwrap();

        let filter = AppointmentFilter::engine_candidates();
        assert_eq!(store.appointment_candidates(&filter).await.unwrap().len(), 1);

        assert!(
            store
                .transition_appointment(&appt.id, AppointmentStatus::Upcoming, AppointmentStatus::Canceled)
                .await
                .unwrap()
        );
        assert!(store.appointment_candidates(&filter).await.unwrap().is_empty());
        store.shutdown().await.unwrap();
    }
}
