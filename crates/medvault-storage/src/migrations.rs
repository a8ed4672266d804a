// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied
//! every time a database is opened.

use medvault_core::MedvaultError;
use tracing::info;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply all pending migrations on a plain (blocking) connection.
///
/// Applied versions are tracked in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), MedvaultError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(MedvaultError::storage)?;
    for migration in report.applied_migrations() {
        info!(version = migration.version(), name = %migration.name(), "applied migration");
    }
    Ok(())
}
