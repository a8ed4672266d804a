// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User and doctor rows.

use medvault_core::MedvaultError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::{Doctor, User};

pub async fn insert_user(db: &Database, user: &User) -> Result<(), MedvaultError> {
    let user = user.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, email, full_name) VALUES (?1, ?2, ?3)",
                params![user.id, user.email, user.full_name],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_user(db: &Database, id: &str) -> Result<Option<User>, MedvaultError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, email, full_name FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        full_name: row.get(2)?,
                    })
                },
            );
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

pub async fn insert_doctor(db: &Database, doctor: &Doctor) -> Result<(), MedvaultError> {
    let doctor = doctor.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO doctors (id, email, full_name, specialization)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    doctor.id,
                    doctor.email,
                    doctor.full_name,
                    doctor.specialization
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
