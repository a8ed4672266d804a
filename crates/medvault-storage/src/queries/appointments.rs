// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Appointment queries and compare-and-set status writes.

use chrono::{DateTime, Utc};
use medvault_core::filter::AppointmentFilter;
use medvault_core::types::{Appointment, AppointmentCandidate, AppointmentStatus, Recipient};
use medvault_core::MedvaultError;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

use crate::database::{Database, map_tr_err};
use crate::models::{decode_enum, decode_time, encode_time};

const APPOINTMENT_COLUMNS: &str = "a.id, a.user_id, a.doctor_id, a.start_time, a.end_time, \
     a.status, a.description, a.created_at, a.updated_at";

fn appointment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        doctor_id: row.get(2)?,
        start_time: decode_time(3, &row.get::<_, String>(3)?)?,
        end_time: decode_time(4, &row.get::<_, String>(4)?)?,
        status: decode_enum(5, &row.get::<_, String>(5)?)?,
        description: row.get(6)?,
        created_at: decode_time(7, &row.get::<_, String>(7)?)?,
        updated_at: decode_time(8, &row.get::<_, String>(8)?)?,
    })
}

/// Translate a filter into a `WHERE` clause and its bound values.
fn where_clause(filter: &AppointmentFilter) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    let mut push_in = |column: &str, negate: bool, statuses: &[AppointmentStatus]| {
        let marks = vec!["?"; statuses.len()].join(", ");
        let op = if negate { "NOT IN" } else { "IN" };
        clauses.push(format!("{column} {op} ({marks})"));
        values.extend(statuses.iter().map(|s| Value::Text(s.to_string())));
    };
    if let Some(statuses) = &filter.statuses {
        if statuses.is_empty() {
            return ("WHERE 0".to_string(), Vec::new());
        }
        push_in("a.status", false, statuses);
    }
    if !filter.exclude_statuses.is_empty() {
        push_in("a.status", true, &filter.exclude_statuses);
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), values)
    }
}

pub async fn insert_appointment(db: &Database, appt: &Appointment) -> Result<(), MedvaultError> {
    if appt.start_time > appt.end_time {
        return Err(MedvaultError::Validation(format!(
            "appointment {} starts after it ends",
            appt.id
        )));
    }
    let appt = appt.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO appointments
                 (id, user_id, doctor_id, start_time, end_time, status, description,
                  created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    appt.id,
                    appt.user_id,
                    appt.doctor_id,
                    encode_time(appt.start_time),
                    encode_time(appt.end_time),
                    appt.status.to_string(),
                    appt.description,
                    encode_time(appt.created_at),
                    encode_time(appt.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_appointment(db: &Database, id: &str) -> Result<Option<Appointment>, MedvaultError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments a WHERE a.id = ?1");
            match conn.query_row(&sql, params![id], appointment_from_row) {
                Ok(appt) => Ok(Some(appt)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Appointments matching `filter` with owner and doctor details, oldest start first.
///
/// Rows whose owner no longer exists are not returned.
pub async fn candidates(
    db: &Database,
    filter: &AppointmentFilter,
) -> Result<Vec<AppointmentCandidate>, MedvaultError> {
    let (where_sql, values) = where_clause(filter);
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {APPOINTMENT_COLUMNS}, u.email, u.full_name, d.full_name
                 FROM appointments a
                 JOIN users u ON u.id = a.user_id
                 LEFT JOIN doctors d ON d.id = a.doctor_id
                 {where_sql}
                 ORDER BY a.start_time, a.id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values), |row| {
                Ok(AppointmentCandidate {
                    appointment: appointment_from_row(row)?,
                    recipient: Recipient {
                        email: row.get(9)?,
                        name: row.get(10)?,
                    },
                    doctor_name: row.get(11)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Set `to` only while the row still holds `from`.
///
/// Returns whether a row was updated.
pub async fn transition(
    db: &Database,
    id: &str,
    from: AppointmentStatus,
    to: AppointmentStatus,
    at: DateTime<Utc>,
) -> Result<bool, MedvaultError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE appointments SET status = ?1, updated_at = ?2
                 WHERE id = ?3 AND status = ?4",
                params![to.to_string(), encode_time(at), id, from.to_string()],
            )?;
            tx.commit()?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}
