// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store, the notifier and the engines.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::MedvaultError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Notifier,
    Observability,
}

/// Lifecycle status of an appointment.
///
/// The string forms are the values persisted in the `appointments.status`
/// column and must not change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AppointmentStatus {
    #[strum(to_string = "Upcoming")]
    #[serde(rename = "Upcoming")]
    Upcoming,
    #[strum(to_string = "30mins_Notified")]
    #[serde(rename = "30mins_Notified")]
    ThirtyMinsNotified,
    #[strum(to_string = "Notified")]
    #[serde(rename = "Notified")]
    Notified,
    #[strum(to_string = "Ongoing")]
    #[serde(rename = "Ongoing")]
    Ongoing,
    #[strum(to_string = "Completed")]
    #[serde(rename = "Completed")]
    Completed,
    #[strum(to_string = "Missed")]
    #[serde(rename = "Missed")]
    Missed,
    #[strum(to_string = "Canceled")]
    #[serde(rename = "Canceled")]
    Canceled,
}

impl AppointmentStatus {
    /// Statuses the engine never leaves once reached.
    pub const TERMINAL: [AppointmentStatus; 3] = [
        AppointmentStatus::Completed,
        AppointmentStatus::Missed,
        AppointmentStatus::Canceled,
    ];

    /// Statuses from which a participant may join.
    pub const JOINABLE: [AppointmentStatus; 2] = [
        AppointmentStatus::ThirtyMinsNotified,
        AppointmentStatus::Notified,
    ];

    pub fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }

    pub fn is_joinable(self) -> bool {
        Self::JOINABLE.contains(&self)
    }
}

/// Lifecycle status of a medication course.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MedicationStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl MedicationStatus {
    /// Statuses the medication engine evaluates.
    pub const ACTIVE: [MedicationStatus; 2] = [MedicationStatus::Upcoming, MedicationStatus::Ongoing];
}

/// Coarse part of the day used as the dose idempotence key.
///
/// `morning` covers [08:00, 12:00), `afternoon` [12:00, 18:00) and `night`
/// [18:00, 24:00). The small hours [00:00, 08:00) count as `night`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Morning,
    Afternoon,
    Night,
}

impl Period {
    pub fn from_hour(hour: u32) -> Period {
        match hour {
            8..=11 => Period::Morning,
            12..=17 => Period::Afternoon,
            _ => Period::Night,
        }
    }

    pub fn of(time: NaiveTime) -> Period {
        Period::from_hour(time.hour())
    }
}

/// A stored appointment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub user_id: String,
    pub doctor_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Create a fresh `Upcoming` appointment, rejecting `start > end`.
    pub fn new(
        user_id: impl Into<String>,
        doctor_id: Option<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        description: Option<String>,
    ) -> Result<Self, MedvaultError> {
        if start_time > end_time {
            return Err(MedvaultError::Validation(format!(
                "appointment start {start_time} is after end {end_time}"
            )));
        }
        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            doctor_id,
            start_time,
            end_time,
            status: AppointmentStatus::Upcoming,
            description,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether `now` falls inside `[start_time, end_time]`.
    pub fn is_in_window(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now <= self.end_time
    }
}

/// One raw entry of a medication schedule, as stored.
///
/// Kept as strings so malformed rows survive in the store and are skipped
/// at evaluation time instead of failing the whole medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Period label (`morning`, `afternoon`, `night`).
    pub when: String,
    /// Time of day, `HH:MM`.
    pub time: String,
}

/// A schedule entry that parsed cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoseSlot {
    pub period: Period,
    pub time: NaiveTime,
}

impl ScheduleEntry {
    pub fn new(when: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            when: when.into(),
            time: time.into(),
        }
    }

    pub fn parse(&self) -> Result<DoseSlot, MedvaultError> {
        let period = self.when.trim().parse::<Period>().map_err(|_| {
            MedvaultError::InvalidSchedule(format!("unknown period label `{}`", self.when))
        })?;
        let time = NaiveTime::parse_from_str(self.time.trim(), "%H:%M").map_err(|e| {
            MedvaultError::InvalidSchedule(format!("bad time `{}`: {e}", self.time))
        })?;
        Ok(DoseSlot { period, time })
    }
}

/// A stored medication row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub count: u32,
    pub count_left: u32,
    pub schedule: Vec<ScheduleEntry>,
    pub status: MedicationStatus,
    pub last_sent_period: Option<Period>,
    /// Local calendar day on which `last_sent_period` was recorded.
    pub last_sent_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medication {
    /// Create a fresh `upcoming` course with `count_left == count`.
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        count: u32,
        schedule: Vec<ScheduleEntry>,
    ) -> Result<Self, MedvaultError> {
        if count == 0 {
            return Err(MedvaultError::Validation(
                "medication count must be at least 1".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            count,
            count_left: count,
            schedule,
            status: MedicationStatus::Upcoming,
            last_sent_period: None,
            last_sent_on: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether a dose was already sent for `period` on `day`.
    pub fn already_sent(&self, day: NaiveDate, period: Period) -> bool {
        self.last_sent_on == Some(day) && self.last_sent_period == Some(period)
    }
}

/// Where a notification is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

/// An appointment joined with what the engine needs to notify about it.
#[derive(Debug, Clone)]
pub struct AppointmentCandidate {
    pub appointment: Appointment,
    pub recipient: Recipient,
    pub doctor_name: Option<String>,
}

/// A medication joined with its owner's contact details.
#[derive(Debug, Clone)]
pub struct MedicationCandidate {
    pub medication: Medication,
    pub recipient: Recipient,
}

/// Mutation of a medication row produced by one evaluation.
///
/// Committed with a compare-and-set on `expected_count_left` so a row that
/// changed since it was read is never overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct MedicationUpdate {
    pub id: String,
    pub expected_count_left: u32,
    pub count_left: u32,
    pub status: MedicationStatus,
    pub last_sent_period: Option<Period>,
    pub last_sent_on: Option<NaiveDate>,
}

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AppointmentReminder,
    AppointmentOngoing,
    AppointmentCompleted,
    AppointmentMissed,
    DoseDue,
    CourseCompleted,
}

/// Identifies the transition a notification belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Correlation {
    pub entity_id: String,
    pub kind: NotificationKind,
    /// Period or slot the notification was produced for, if any.
    pub slot: Option<String>,
}

/// A rendered message ready for delivery. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: Recipient,
    pub subject: String,
    pub body: String,
    /// Extra template fields (footer, action_url, action_text, current_year).
    pub fields: BTreeMap<String, String>,
    pub correlation: Correlation,
}
