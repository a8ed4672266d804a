// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Medvault reminder engine.
//!
//! Provides the domain types (appointments, medications, notifications),
//! the error type, typed query filters, and the collaborator traits that
//! the storage and notifier crates implement.

pub mod error;
pub mod filter;
pub mod traits;
pub mod types;

pub use error::MedvaultError;
pub use filter::{AppointmentFilter, MedicationFilter};
pub use types::{
    AdapterType, Appointment, AppointmentCandidate, AppointmentStatus, Correlation, DoseSlot,
    HealthStatus, Medication, MedicationCandidate, MedicationStatus, MedicationUpdate,
    Notification, NotificationKind, Period, Recipient, ScheduleEntry,
};

pub use traits::{AppointmentStore, Clock, MedicationStore, Notifier, PluginAdapter, SystemClock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medvault_error_variants_render() {
        let cases: Vec<MedvaultError> = vec![
            MedvaultError::Config("bad".into()),
            MedvaultError::storage(std::io::Error::other("disk")),
            MedvaultError::notify("smtp rejected", std::io::Error::other("550")),
            MedvaultError::NotFound {
                entity: "appointment",
                id: "a1".into(),
            },
            MedvaultError::InvalidTransition {
                id: "a1".into(),
                status: "Completed".into(),
            },
            MedvaultError::InvalidSchedule("25:00".into()),
            MedvaultError::Validation("start after end".into()),
            MedvaultError::Internal("oops".into()),
        ];
        let rendered: Vec<String> = cases.iter().map(|e| e.to_string()).collect();
        assert_eq!(rendered[0], "configuration error: bad");
        assert_eq!(rendered[1], "storage error: disk");
        assert_eq!(rendered[2], "notification error: smtp rejected");
        assert_eq!(rendered[3], "appointment not found: a1");
        assert!(rendered[4].contains("Completed"));
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;
        for variant in [
            AdapterType::Storage,
            AdapterType::Notifier,
            AdapterType::Observability,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).unwrap();
            assert_eq!(parsed, variant);
        }
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_appointment_store<T: AppointmentStore>() {}
        fn _assert_medication_store<T: MedicationStore>() {}
        fn _assert_notifier<T: Notifier>() {}
        fn _assert_clock<T: Clock>() {}
        _assert_clock::<SystemClock>();
    }
}
