// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query predicates for candidate selection.
//!
//! Every field is an optional restriction; an empty filter matches all rows.
//! Stores translate a filter into their own query language, and
//! [`AppointmentFilter::matches`] / [`MedicationFilter::matches`] give the
//! reference semantics for in-memory stores.

use crate::types::{Appointment, AppointmentStatus, Medication, MedicationStatus};

/// Restrictions on which appointments a store returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    /// Only these statuses, if set.
    pub statuses: Option<Vec<AppointmentStatus>>,
    /// Never these statuses.
    pub exclude_statuses: Vec<AppointmentStatus>,
}

impl AppointmentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything the appointment engine evaluates: all non-terminal rows.
    pub fn engine_candidates() -> Self {
        Self::new().exclude(&AppointmentStatus::TERMINAL)
    }

    pub fn exclude(mut self, statuses: &[AppointmentStatus]) -> Self {
        self.exclude_statuses.extend_from_slice(statuses);
        self
    }

    pub fn matches(&self, appt: &Appointment) -> bool {
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&appt.status) {
                return false;
            }
        }
        !self.exclude_statuses.contains(&appt.status)
    }
}

/// Restrictions on which medications a store returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedicationFilter {
    /// Only these statuses, if set.
    pub statuses: Option<Vec<MedicationStatus>>,
}

impl MedicationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything the medication engine evaluates: `upcoming` and `ongoing` rows.
    pub fn engine_candidates() -> Self {
        Self::new().with_statuses(&MedicationStatus::ACTIVE)
    }

    pub fn with_statuses(mut self, statuses: &[MedicationStatus]) -> Self {
        self.statuses = Some(statuses.to_vec());
        self
    }

    pub fn matches(&self, med: &Medication) -> bool {
        self.statuses
            .as_ref()
            .is_none_or(|statuses| statuses.contains(&med.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn appt(status: AppointmentStatus) -> Appointment {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let mut a = Appointment::new("u1", None, start, start + Duration::hours(1), None).unwrap();
        a.status = status;
        a
    }

    #[test]
    fn engine_filter_drops_terminal_statuses() {
        let f = AppointmentFilter::engine_candidates();
        assert!(f.matches(&appt(AppointmentStatus::Upcoming)));
        assert!(f.matches(&appt(AppointmentStatus::Ongoing)));
        assert!(!f.matches(&appt(AppointmentStatus::Completed)));
        assert!(!f.matches(&appt(AppointmentStatus::Missed)));
        assert!(!f.matches(&appt(AppointmentStatus::Canceled)));
    }

    #[test]
    fn status_allow_list_and_deny_list_combine() {
        let f = AppointmentFilter {
            statuses: Some(vec![AppointmentStatus::Upcoming, AppointmentStatus::Notified]),
            ..AppointmentFilter::new()
        }
        .exclude(&[AppointmentStatus::Notified]);
        assert!(f.matches(&appt(AppointmentStatus::Upcoming)));
        assert!(!f.matches(&appt(AppointmentStatus::Notified)));
        assert!(!f.matches(&appt(AppointmentStatus::Ongoing)));
        assert!(AppointmentFilter::new().matches(&appt(AppointmentStatus::Canceled)));
    }

    #[test]
    fn medication_engine_filter_keeps_active_courses() {
        let mut med = Medication::new("u1", "Vitamin D", 5, vec![]).unwrap();
        let f = MedicationFilter::engine_candidates();
        assert!(f.matches(&med));
        med.status = MedicationStatus::Ongoing;
        assert!(f.matches(&med));
        med.status = MedicationStatus::Completed;
        assert!(!f.matches(&med));
        assert!(MedicationFilter::new().matches(&med));
    }
}
