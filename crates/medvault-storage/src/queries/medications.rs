// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Medication queries and guarded dose commits.

use chrono::{DateTime, Utc};
use medvault_core::filter::MedicationFilter;
use medvault_core::types::{Medication, MedicationCandidate, MedicationUpdate, Period, Recipient};
use medvault_core::MedvaultError;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

use crate::database::{Database, map_tr_err};
use crate::models::{decode_date, decode_enum, decode_schedule, decode_time, encode_schedule, encode_time};

const MEDICATION_COLUMNS: &str = "m.id, m.user_id, m.name, m.count, m.count_left, m.schedule, \
     m.status, m.last_sent_period, m.last_sent_on, m.created_at, m.updated_at";

fn medication_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Medication> {
    let id: String = row.get(0)?;
    let schedule_raw: String = row.get(5)?;
    let last_sent_period = row
        .get::<_, Option<String>>(7)?
        .map(|raw| decode_enum::<Period>(7, &raw))
        .transpose()?;
    Ok(Medication {
        schedule: decode_schedule(&id, &schedule_raw),
        user_id: row.get(1)?,
        name: row.get(2)?,
        count: row.get(3)?,
        count_left: row.get(4)?,
        status: decode_enum(6, &row.get::<_, String>(6)?)?,
        last_sent_period,
        last_sent_on: decode_date(8, row.get(8)?)?,
        created_at: decode_time(9, &row.get::<_, String>(9)?)?,
        updated_at: decode_time(10, &row.get::<_, String>(10)?)?,
        id,
    })
}

fn where_clause(filter: &MedicationFilter) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(statuses) = &filter.statuses {
        if statuses.is_empty() {
            return ("WHERE 0".to_string(), Vec::new());
        }
        let marks = vec!["?"; statuses.len()].join(", ");
        clauses.push(format!("m.status IN ({marks})"));
        values.extend(statuses.iter().map(|s| Value::Text(s.to_string())));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), values)
    }
}

pub async fn insert_medication(db: &Database, med: &Medication) -> Result<(), MedvaultError> {
    if med.count_left > med.count {
        return Err(MedvaultError::Validation(format!(
            "medication {} has count_left {} above count {}",
            med.id, med.count_left, med.count
        )));
    }
    let med = med.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO medications
                 (id, user_id, name, count, count_left, schedule, status,
                  last_sent_period, last_sent_on, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    med.id,
                    med.user_id,
                    med.name,
                    med.count,
                    med.count_left,
                    encode_schedule(&med.schedule),
                    med.status.to_string(),
                    med.last_sent_period.map(|p| p.to_string()),
                    med.last_sent_on.map(|d| d.to_string()),
                    encode_time(med.created_at),
                    encode_time(med.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Store a schedule column verbatim. Lets callers keep malformed entries.
pub async fn set_raw_schedule(db: &Database, id: &str, raw: &str) -> Result<(), MedvaultError> {
    let id = id.to_string();
    let raw = raw.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE medications SET schedule = ?1 WHERE id = ?2",
                params![raw, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_medication(db: &Database, id: &str) -> Result<Option<Medication>, MedvaultError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {MEDICATION_COLUMNS} FROM medications m WHERE m.id = ?1");
            match conn.query_row(&sql, params![id], medication_from_row) {
                Ok(med) => Ok(Some(med)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Medications matching `filter` with their owner's contact details.
pub async fn candidates(
    db: &Database,
    filter: &MedicationFilter,
) -> Result<Vec<MedicationCandidate>, MedvaultError> {
    let (where_sql, values) = where_clause(filter);
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {MEDICATION_COLUMNS}, u.email, u.full_name
                 FROM medications m
                 JOIN users u ON u.id = m.user_id
                 {where_sql}
                 ORDER BY m.created_at, m.id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values), |row| {
                Ok(MedicationCandidate {
                    medication: medication_from_row(row)?,
                    recipient: Recipient {
                        email: row.get(11)?,
                        name: row.get(12)?,
                    },
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Apply `update` while `count_left` still equals `expected_count_left`.
///
/// Returns whether a row was updated.
pub async fn commit(
    db: &Database,
    update: &MedicationUpdate,
    at: DateTime<Utc>,
) -> Result<bool, MedvaultError> {
    let update = update.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE medications
                 SET count_left = ?1, status = ?2, last_sent_period = ?3, last_sent_on = ?4,
                     updated_at = ?5
                 WHERE id = ?6 AND count_left = ?7",
                params![
                    update.count_left,
                    update.status.to_string(),
                    update.last_sent_period.map(|p| p.to_string()),
                    update.last_sent_on.map(|d| d.to_string()),
                    encode_time(at),
                    update.id,
                    update.expected_count_left,
                ],
            )?;
            tx.commit()?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}
