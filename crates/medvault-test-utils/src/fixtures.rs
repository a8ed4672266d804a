// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Small builders for test rows.

use chrono::{DateTime, Duration, Utc};
use medvault_core::types::{Appointment, Medication, Recipient, ScheduleEntry};

/// Parse an RFC 3339 timestamp. Panics on bad input; test use only.
pub fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .unwrap_or_else(|e| panic!("bad timestamp `{s}`: {e}"))
        .with_timezone(&Utc)
}

pub fn recipient(name: &str) -> Recipient {
    Recipient {
        email: format!("{}@example.org", name.to_lowercase()),
        name: name.to_string(),
    }
}

/// An `Upcoming` appointment starting at `start` and lasting `minutes`.
pub fn appointment(user_id: &str, start: DateTime<Utc>, minutes: i64) -> Appointment {
    Appointment::new(
        user_id,
        None,
        start,
        start + Duration::minutes(minutes),
        Some("Follow-up".to_string()),
    )
    .unwrap_or_else(|e| panic!("fixture appointment: {e}"))
}

/// A fresh course with one schedule entry per `(period, "HH:MM")` pair.
pub fn medication(user_id: &str, name: &str, count: u32, slots: &[(&str, &str)]) -> Medication {
    let schedule = slots
        .iter()
        .map(|(when, time)| ScheduleEntry::new(*when, *time))
        .collect();
    Medication::new(user_id, name, count, schedule)
        .unwrap_or_else(|e| panic!("fixture medication: {e}"))
}
