// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Appointment lifecycle: the transition table, the periodic pass and joins.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use medvault_config::model::SchedulerConfig;
use medvault_core::filter::AppointmentFilter;
use medvault_core::types::{
    Appointment, AppointmentCandidate, AppointmentStatus, NotificationKind,
};
use medvault_core::{AppointmentStore, MedvaultError, Notifier};
use medvault_notify::Templates;

use crate::report::{PassKind, PassReport, RowFailure, RowReport};
use crate::scheduler::Pass;

/// Tunables for the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppointmentRules {
    /// How far ahead of `start_time` the reminder fires.
    pub reminder_lead: Duration,
    /// Whether `Upcoming` rows whose windows were skipped move on.
    pub catch_up: bool,
}

impl Default for AppointmentRules {
    fn default() -> Self {
        Self {
            reminder_lead: Duration::minutes(30),
            catch_up: true,
        }
    }
}

impl AppointmentRules {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            reminder_lead: Duration::minutes(i64::from(config.reminder_lead_minutes)),
            catch_up: config.catch_up,
        }
    }
}

/// An edge of the appointment state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: AppointmentStatus,
    pub to: AppointmentStatus,
    pub notice: NotificationKind,
}

/// The edge that applies to `appt` at `now`, if any.
///
/// Conditions are disjoint per status, so at most one edge applies. No edge
/// leads from `Upcoming` to `Completed`, and terminal statuses have none.
pub fn next_transition(
    appt: &Appointment,
    now: DateTime<Utc>,
    rules: &AppointmentRules,
) -> Option<Transition> {
    use AppointmentStatus::*;

    let (start, end) = (appt.start_time, appt.end_time);
    let edge = |to, notice| {
        Some(Transition {
            from: appt.status,
            to,
            notice,
        })
    };

    match appt.status {
        Upcoming if now <= start && start <= now + rules.reminder_lead => {
            edge(ThirtyMinsNotified, NotificationKind::AppointmentReminder)
        }
        Upcoming if rules.catch_up && start < now && now <= end => {
            edge(Notified, NotificationKind::AppointmentOngoing)
        }
        Upcoming if rules.catch_up && now > end => edge(Missed, NotificationKind::AppointmentMissed),
        ThirtyMinsNotified if start <= now && now <= end => {
            edge(Notified, NotificationKind::AppointmentOngoing)
        }
        ThirtyMinsNotified | Notified if now > end => {
            edge(Missed, NotificationKind::AppointmentMissed)
        }
        Ongoing if now > end => edge(Completed, NotificationKind::AppointmentCompleted),
        _ => None,
    }
}

/// Drives appointments through the transition table once per pass.
pub struct AppointmentEngine {
    store: Arc<dyn AppointmentStore>,
    notifier: Arc<dyn Notifier>,
    templates: Templates,
    rules: AppointmentRules,
}

impl AppointmentEngine {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        notifier: Arc<dyn Notifier>,
        templates: Templates,
        rules: AppointmentRules,
    ) -> Self {
        Self {
            store,
            notifier,
            templates,
            rules,
        }
    }

    /// Evaluate every non-terminal appointment against `now`.
    ///
    /// Row failures are recorded in the report; only a failed candidate
    /// query fails the pass.
    pub async fn run_pass(&self, now: DateTime<Utc>) -> Result<PassReport, MedvaultError> {
        let candidates = self
            .store
            .appointment_candidates(&AppointmentFilter::engine_candidates())
            .await?;
        debug!(count = candidates.len(), %now, "evaluating appointments");

        let mut report = PassReport::new(PassKind::Appointments, now);
        for candidate in &candidates {
            report.push(self.evaluate(candidate, now).await);
        }
        Ok(report)
    }

    /// Notify first, then commit. A failed send leaves the row as it was.
    async fn evaluate(&self, candidate: &AppointmentCandidate, now: DateTime<Utc>) -> RowReport {
        let appt = &candidate.appointment;
        let Some(t) = next_transition(appt, now, &self.rules) else {
            return RowReport::unchanged(&appt.id);
        };

        let notification = match self.templates.appointment(t.notice, candidate, now) {
            Ok(n) => n,
            Err(e) => {
                warn!(appointment_id = %appt.id, error = %e, "could not render notice");
                return RowReport::failed(&appt.id, RowFailure::Notify(e.to_string()));
            }
        };
        if let Err(e) = self.notifier.send(&notification).await {
            warn!(
                appointment_id = %appt.id,
                from = %t.from,
                to = %t.to,
                error = %e,
                "notification failed, transition deferred"
            );
            return RowReport::failed(&appt.id, RowFailure::Notify(e.to_string()));
        }

        match self.store.transition_appointment(&appt.id, t.from, t.to).await {
            Ok(true) => {
                info!(appointment_id = %appt.id, from = %t.from, to = %t.to, "appointment transitioned");
                RowReport::changed(&appt.id, t.from, t.to, 1)
            }
            Ok(false) => {
                warn!(
                    appointment_id = %appt.id,
                    expected = %t.from,
                    "appointment changed during pass, transition dropped"
                );
                RowReport::failed(&appt.id, RowFailure::Conflict).with_sent(1)
            }
            Err(e) => {
                warn!(appointment_id = %appt.id, error = %e, "failed to commit transition");
                RowReport::failed(&appt.id, RowFailure::Storage(e.to_string())).with_sent(1)
            }
        }
    }
}

#[async_trait]
impl Pass for AppointmentEngine {
    fn kind(&self) -> PassKind {
        PassKind::Appointments
    }

    async fn run_pass(&self, now: DateTime<Utc>) -> Result<PassReport, MedvaultError> {
        AppointmentEngine::run_pass(self, now).await
    }
}

/// Move a joinable appointment to `Ongoing`.
///
/// Fails with [`MedvaultError::NotFound`] for an unknown id and with
/// [`MedvaultError::InvalidTransition`] when the status is not joinable,
/// `now` is outside `[start_time, end_time]`, or the row changed between
/// the read and the guarded write. Nothing is mutated on failure.
pub async fn join_appointment(
    store: &dyn AppointmentStore,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Appointment, MedvaultError> {
    let appt = store
        .get_appointment(id)
        .await?
        .ok_or_else(|| MedvaultError::NotFound {
            entity: "appointment",
            id: id.to_string(),
        })?;

    let invalid = |status: AppointmentStatus| MedvaultError::InvalidTransition {
        id: id.to_string(),
        status: status.to_string(),
    };
    if !appt.status.is_joinable() || !appt.is_in_window(now) {
        debug!(appointment_id = id, status = %appt.status, "join refused");
        return Err(invalid(appt.status));
    }

    if !store
        .transition_appointment(id, appt.status, AppointmentStatus::Ongoing)
        .await?
    {
        warn!(appointment_id = id, "appointment changed before join could commit");
        return Err(invalid(appt.status));
    }

    info!(appointment_id = id, from = %appt.status, "appointment joined");
    Ok(Appointment {
        status: AppointmentStatus::Ongoing,
        ..appt
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, h, m, 0).unwrap()
    }

    fn appt(status: AppointmentStatus) -> Appointment {
        let mut a = Appointment::new("u1", None, at(10, 0), at(11, 0), None).unwrap();
        a.status = status;
        a
    }

    fn to(a: &Appointment, now: DateTime<Utc>) -> Option<AppointmentStatus> {
        next_transition(a, now, &AppointmentRules::default()).map(|t| t.to)
    }

    #[test]
    fn reminder_fires_inside_lead_window() {
        let a = appt(AppointmentStatus::Upcoming);
        assert_eq!(to(&a, at(9, 29)), None);
        assert_eq!(to(&a, at(9, 30)), Some(AppointmentStatus::ThirtyMinsNotified));
        assert_eq!(to(&a, at(10, 0)), Some(AppointmentStatus::ThirtyMinsNotified));
    }

    #[test]
    fn reminded_becomes_notified_at_start() {
        let a = appt(AppointmentStatus::ThirtyMinsNotified);
        assert_eq!(to(&a, at(9, 59)), None);
        assert_eq!(to(&a, at(10, 0)), Some(AppointmentStatus::Notified));
        assert_eq!(to(&a, at(11, 0)), Some(AppointmentStatus::Notified));
        assert_eq!(to(&a, at(11, 1)), Some(AppointmentStatus::Missed));
    }

    #[test]
    fn end_of_window_closes_out() {
        assert_eq!(to(&appt(AppointmentStatus::Notified), at(11, 0)), None);
        assert_eq!(
            to(&appt(AppointmentStatus::Notified), at(11, 1)),
            Some(AppointmentStatus::Missed)
        );
        assert_eq!(
            to(&appt(AppointmentStatus::Ongoing), at(11, 1)),
            Some(AppointmentStatus::Completed)
        );
        assert_eq!(to(&appt(AppointmentStatus::Ongoing), at(10, 30)), None);
    }

    #[test]
    fn catch_up_edges_follow_configuration() {
        let a = appt(AppointmentStatus::Upcoming);
        assert_eq!(to(&a, at(10, 15)), Some(AppointmentStatus::Notified));
        assert_eq!(to(&a, at(12, 0)), Some(AppointmentStatus::Missed));

        let strict = AppointmentRules {
            catch_up: false,
            ..AppointmentRules::default()
        };
        assert_eq!(next_transition(&a, at(10, 15), &strict), None);
        assert_eq!(next_transition(&a, at(12, 0), &strict), None);
    }

    #[test]
    fn terminal_statuses_have_no_edges() {
        for status in AppointmentStatus::TERMINAL {
            let a = appt(status);
            for now in [at(9, 0), at(9, 45), at(10, 30), at(12, 0)] {
                assert_eq!(to(&a, now), None, "{status} at {now}");
            }
        }
    }

    #[test]
    fn upcoming_never_completes() {
        let a = appt(AppointmentStatus::Upcoming);
        for minutes in -120..=240 {
            let now = at(10, 0) + Duration::minutes(minutes);
            assert_ne!(to(&a, now), Some(AppointmentStatus::Completed));
        }
    }

    #[test]
    fn notices_match_target_status() {
        let a = appt(AppointmentStatus::ThirtyMinsNotified);
        let t = next_transition(&a, at(10, 5), &AppointmentRules::default()).unwrap();
        assert_eq!(t.notice, NotificationKind::AppointmentOngoing);
        let t = next_transition(&a, at(11, 5), &AppointmentRules::default()).unwrap();
        assert_eq!(t.notice, NotificationKind::AppointmentMissed);
    }
}
