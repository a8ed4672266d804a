// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types owned by the storage layer and column codecs.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use medvault_core::types::ScheduleEntry;
use rusqlite::types::Type;
use tracing::warn;

/// A patient. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
}

/// A doctor. Only the display name reaches notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctor {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub specialization: Option<String>,
}

/// UTC instant as stored: RFC 3339, millisecond precision, `Z` suffix.
pub(crate) fn encode_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn decode_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn decode_date(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Parse a strum-backed enum column.
pub(crate) fn decode_enum<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn encode_schedule(entries: &[ScheduleEntry]) -> String {
    serde_json::to_string(entries).unwrap_or_else(|_| "[]".to_string())
}

/// Decode the raw schedule column leniently.
///
/// Entries with missing or non-string fields become empty strings so they
/// fail slot parsing later and are skipped individually. A column that is
/// not a JSON array yields an empty schedule.
pub(crate) fn decode_schedule(medication_id: &str, raw: &str) -> Vec<ScheduleEntry> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(medication_id, error = %e, "schedule column is not valid JSON");
            return Vec::new();
        }
    };
    let Some(items) = value.as_array() else {
        warn!(medication_id, "schedule column is not a JSON array");
        return Vec::new();
    };
    items
        .iter()
        .map(|item| {
            let field = |name: &str| {
                item.get(name)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string()
            };
            ScheduleEntry {
                when: field("when"),
                time: field("time"),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn encoded_times_sort_lexically() {
        let a = Utc.with_ymd_and_hms(2026, 3, 1, 9, 59, 59).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        assert!(encode_time(a) < encode_time(b));
        assert_eq!(encode_time(b), "2026-03-01T10:00:00.000Z");
        assert_eq!(decode_time(0, &encode_time(b)).unwrap(), b);
    }

    #[test]
    fn malformed_schedule_entries_survive_decoding() {
        let raw = r#"[{"when":"morning","time":"08:00"},{"when":"night"},{"time":7},"junk"]"#;
        let entries = decode_schedule("m1", raw);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0], ScheduleEntry::new("morning", "08:00"));
        assert_eq!(entries[1], ScheduleEntry::new("night", ""));
        assert_eq!(entries[2], ScheduleEntry::new("", ""));
        assert!(entries[3].parse().is_err());
    }

    #[test]
    fn non_array_schedule_is_empty() {
        assert!(decode_schedule("m1", "{\"when\":\"morning\"}").is_empty());
        assert!(decode_schedule("m1", "not json").is_empty());
    }
}
