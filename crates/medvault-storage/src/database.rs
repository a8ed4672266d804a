// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements run on tokio-rusqlite's single background thread, so
//! `Database` is the one writer for the file. Do not open extra connections
//! for writes.

use std::path::Path;

use medvault_config::model::StorageConfig;
use medvault_core::MedvaultError;
use tracing::debug;

use crate::migrations;

/// Handle to an open, migrated SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open `path` with default storage settings.
    pub async fn open(path: &str) -> Result<Self, MedvaultError> {
        let config = StorageConfig {
            database_path: path.to_string(),
            ..StorageConfig::default()
        };
        Self::open_with(&config).await
    }

    /// Open the configured database, creating it and applying migrations.
    ///
    /// Migrations run on a short-lived blocking connection before the
    /// long-lived async connection is opened.
    pub async fn open_with(config: &StorageConfig) -> Result<Self, MedvaultError> {
        let path = config.database_path.clone();
        if let Some(parent) = Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(MedvaultError::storage)?;
            }
        }

        let wal_mode = config.wal_mode;
        let migrate_path = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), MedvaultError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(MedvaultError::storage)?;
            let journal = if wal_mode { "WAL" } else { "DELETE" };
            conn.pragma_update_and_check(None, "journal_mode", journal, |row| {
                row.get::<_, String>(0)
            })
            .map_err(MedvaultError::storage)?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| MedvaultError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(MedvaultError::storage)?;

        let busy_timeout_ms = config.busy_timeout_ms;
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.busy_timeout(std::time::Duration::from_millis(busy_timeout_ms))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path = %path, wal = wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The single async connection all queries go through.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), MedvaultError> {
        checkpoint(&self.conn).await?;
        self.conn.close().await.map_err(MedvaultError::storage)?;
        debug!("database closed");
        Ok(())
    }
}

/// Fold the WAL back into the main database file.
pub(crate) async fn checkpoint(conn: &tokio_rusqlite::Connection) -> Result<(), MedvaultError> {
    conn.call(|conn| -> Result<(), rusqlite::Error> {
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)
}

/// Convert a tokio-rusqlite error into a storage error.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> MedvaultError {
    MedvaultError::Storage {
        source: Box::new(e),
    }
}
