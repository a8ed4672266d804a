// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Medication courses: dose reminders, countdown and completion.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, Timelike, Utc};
use tracing::{debug, info, warn};

use medvault_config::model::SchedulerConfig;
use medvault_core::filter::MedicationFilter;
use medvault_core::types::{
    MedicationCandidate, MedicationStatus, MedicationUpdate, Period,
};
use medvault_core::{MedicationStore, MedvaultError, Notifier};
use medvault_notify::Templates;

use crate::report::{PassKind, PassReport, RowFailure, RowReport};
use crate::scheduler::Pass;

pub const DEFAULT_DOSE_TOLERANCE_SECS: u32 = 700;

const SECONDS_PER_DAY: i64 = 86_400;

/// Tunables for dose matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MedicationRules {
    /// A slot is due when `now` is at most this far from it, either side.
    pub tolerance_secs: u32,
    /// Offset of the wall clock schedules are written in.
    pub offset: FixedOffset,
}

impl Default for MedicationRules {
    fn default() -> Self {
        Self {
            tolerance_secs: DEFAULT_DOSE_TOLERANCE_SECS,
            offset: Utc.fix(),
        }
    }
}

impl MedicationRules {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            tolerance_secs: config.dose_tolerance_secs,
            offset: FixedOffset::east_opt(config.utc_offset_minutes.saturating_mul(60))
                .unwrap_or_else(|| Utc.fix()),
        }
    }

    /// Local day, time of day and period for `now`.
    pub fn local(&self, now: DateTime<Utc>) -> (NaiveDate, NaiveTime, Period) {
        let local = now.with_timezone(&self.offset);
        let time = local.time();
        (local.date_naive(), time, Period::of(time))
    }

    /// Local day and period of the occurrence of `slot` nearest to `now`.
    ///
    /// A 00:00 slot served at 23:55 belongs to the next day, and an 08:00
    /// slot served at 07:55 belongs to the morning.
    pub fn occurrence(&self, slot: NaiveTime, now: DateTime<Utc>) -> (NaiveDate, Period) {
        let local = now.with_timezone(&self.offset).naive_local();
        let today = local.date();
        let day = [today.pred_opt(), Some(today), today.succ_opt()]
            .into_iter()
            .flatten()
            .min_by_key(|d| (d.and_time(slot) - local).num_seconds().abs())
            .unwrap_or(today);
        (day, Period::of(slot))
    }

    /// Whether a slot at `slot` is due at local time `now`.
    pub fn is_due(&self, slot: NaiveTime, now: NaiveTime) -> bool {
        circular_distance_secs(slot, now) <= i64::from(self.tolerance_secs)
    }
}

/// Seconds between two times of day, measured the short way around midnight.
pub fn circular_distance_secs(a: NaiveTime, b: NaiveTime) -> i64 {
    let a = i64::from(a.num_seconds_from_midnight());
    let b = i64::from(b.num_seconds_from_midnight());
    let d = (a - b).abs();
    d.min(SECONDS_PER_DAY - d)
}

/// Walks active medication courses once per pass.
pub struct MedicationEngine {
    store: Arc<dyn MedicationStore>,
    notifier: Arc<dyn Notifier>,
    templates: Templates,
    rules: MedicationRules,
}

impl MedicationEngine {
    pub fn new(
        store: Arc<dyn MedicationStore>,
        notifier: Arc<dyn Notifier>,
        templates: Templates,
        rules: MedicationRules,
    ) -> Self {
        Self {
            store,
            notifier,
            templates,
            rules,
        }
    }

    pub async fn run_pass(&self, now: DateTime<Utc>) -> Result<PassReport, MedvaultError> {
        let candidates = self
            .store
            .medication_candidates(&MedicationFilter::engine_candidates())
            .await?;
        debug!(count = candidates.len(), %now, "evaluating medications");

        let mut report = PassReport::new(PassKind::Medications, now);
        for candidate in &candidates {
            report.push(self.evaluate(candidate, now).await);
        }
        Ok(report)
    }

    async fn evaluate(&self, candidate: &MedicationCandidate, now: DateTime<Utc>) -> RowReport {
        let med = &candidate.medication;
        let (today, time, period) = self.rules.local(now);

        let mut state = Progress {
            count_left: med.count_left,
            status: med.status,
            last_sent_period: med.last_sent_period,
            last_sent_on: med.last_sent_on,
            sent: 0,
            malformed: 0,
            failure: None,
        };

        if med.count_left == 0 {
            // Last dose went out but the completion notice did not.
            self.complete(candidate, now, &mut state).await;
        } else if med.already_sent(today, period) {
            return RowReport::unchanged(&med.id);
        } else {
            for entry in &med.schedule {
                let slot = match entry.parse() {
                    Ok(slot) => slot,
                    Err(e) => {
                        warn!(medication_id = %med.id, error = %e, "skipping malformed schedule entry");
                        state.malformed += 1;
                        continue;
                    }
                };
                // One dose per (day, period): once sent, remaining entries are
                // only checked for well-formedness.
                if state.sent > 0 || state.failure.is_some() || state.count_left == 0 {
                    continue;
                }
                if !self.rules.is_due(slot.time, time) {
                    continue;
                }
                // The marker names the occurrence served, so a window that
                // straddles a period or midnight cannot serve it twice.
                let (day, slot_period) = self.rules.occurrence(slot.time, now);
                if med.already_sent(day, slot_period) {
                    continue;
                }

                let notification = self.templates.dose_due(
                    candidate,
                    &slot,
                    state.count_left,
                    day,
                    slot_period,
                    now,
                );
                match self.notifier.send(&notification).await {
                    Ok(()) => {
                        state.count_left -= 1;
                        state.status = MedicationStatus::Ongoing;
                        state.last_sent_period = Some(slot_period);
                        state.last_sent_on = Some(day);
                        state.sent += 1;
                        debug!(
                            medication_id = %med.id,
                            slot = %slot.time.format("%H:%M"),
                            count_left = state.count_left,
                            "dose reminder sent"
                        );
                    }
                    Err(e) => {
                        warn!(medication_id = %med.id, error = %e, "dose reminder failed");
                        state.failure = Some(RowFailure::Notify(e.to_string()));
                    }
                }
            }

            if state.sent > 0 && state.count_left == 0 {
                self.complete(candidate, now, &mut state).await;
            }
        }

        self.commit(candidate, state).await
    }

    async fn complete(
        &self,
        candidate: &MedicationCandidate,
        now: DateTime<Utc>,
        state: &mut Progress,
    ) {
        let notification = self.templates.course_completed(candidate, now);
        match self.notifier.send(&notification).await {
            Ok(()) => {
                state.status = MedicationStatus::Completed;
                state.sent += 1;
            }
            Err(e) => {
                warn!(
                    medication_id = %candidate.medication.id,
                    error = %e,
                    "completion notice failed, will retry next pass"
                );
                state.failure = Some(RowFailure::Notify(e.to_string()));
            }
        }
    }

    async fn commit(&self, candidate: &MedicationCandidate, state: Progress) -> RowReport {
        let med = &candidate.medication;
        let changed = state.count_left != med.count_left || state.status != med.status;

        if !changed {
            let row = match state.failure {
                Some(failure) => RowReport::failed(&med.id, failure),
                None => RowReport::unchanged(&med.id),
            };
            return row.with_sent(state.sent).with_malformed(state.malformed);
        }

        let update = MedicationUpdate {
            id: med.id.clone(),
            expected_count_left: med.count_left,
            count_left: state.count_left,
            status: state.status,
            last_sent_period: state.last_sent_period,
            last_sent_on: state.last_sent_on,
        };
        let row = match self.store.commit_medication(&update).await {
            Ok(true) => {
                info!(
                    medication_id = %med.id,
                    from = %med.status,
                    to = %state.status,
                    count_left = state.count_left,
                    "medication updated"
                );
                match state.failure {
                    Some(failure) => RowReport::failed(&med.id, failure),
                    None => RowReport::changed(
                        &med.id,
                        describe(med.status, med.count_left),
                        describe(state.status, state.count_left),
                        state.sent,
                    ),
                }
            }
            Ok(false) => {
                warn!(
                    medication_id = %med.id,
                    expected_count_left = med.count_left,
                    "medication changed during pass, update dropped"
                );
                RowReport::failed(&med.id, RowFailure::Conflict)
            }
            Err(e) => {
                warn!(medication_id = %med.id, error = %e, "failed to commit medication");
                RowReport::failed(&med.id, RowFailure::Storage(e.to_string()))
            }
        };
        row.with_sent(state.sent).with_malformed(state.malformed)
    }
}

/// Row state accumulated while evaluating one medication.
struct Progress {
    count_left: u32,
    status: MedicationStatus,
    last_sent_period: Option<Period>,
    last_sent_on: Option<NaiveDate>,
    sent: u32,
    malformed: u32,
    failure: Option<RowFailure>,
}

fn describe(status: MedicationStatus, count_left: u32) -> String {
    format!("{status} ({count_left} left)")
}

#[async_trait]
impl Pass for MedicationEngine {
    fn kind(&self) -> PassKind {
        PassKind::Medications
    }

    async fn run_pass(&self, now: DateTime<Utc>) -> Result<PassReport, MedvaultError> {
        MedicationEngine::run_pass(self, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RowOutcome;
    use chrono::TimeZone;
    use medvault_config::model::NotifierConfig;
    use medvault_test_utils::fixtures::{medication, recipient, ts};
    use medvault_test_utils::{InMemoryStore, RecordingNotifier};
    use tracing_test::traced_test;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn distance_wraps_midnight() {
        assert_eq!(circular_distance_secs(t(23, 58), t(0, 3)), 300);
        assert_eq!(circular_distance_secs(t(0, 3), t(23, 58)), 300);
        assert_eq!(circular_distance_secs(t(12, 0), t(0, 0)), 43_200);
        assert_eq!(circular_distance_secs(t(8, 0), t(8, 0)), 0);
    }

    #[test]
    fn tolerance_is_inclusive() {
        let rules = MedicationRules::default();
        let slot = t(8, 0);
        assert!(rules.is_due(slot, NaiveTime::from_hms_opt(8, 11, 40).unwrap()));
        assert!(!rules.is_due(slot, NaiveTime::from_hms_opt(8, 11, 41).unwrap()));
        assert!(rules.is_due(slot, NaiveTime::from_hms_opt(7, 48, 20).unwrap()));
        assert!(!rules.is_due(slot, t(8, 30)));
    }

    #[test]
    fn local_time_applies_offset() {
        let rules = MedicationRules {
            offset: FixedOffset::east_opt(5 * 3600 + 1800).unwrap(),
            ..MedicationRules::default()
        };
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap();
        let (day, time, period) = rules.local(now);
        assert_eq!(day, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(time, t(1, 30));
        assert_eq!(period, Period::Night);
    }

    #[test]
    fn occurrence_follows_the_slot_not_the_clock() {
        let rules = MedicationRules::default();
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();

        assert_eq!(
            rules.occurrence(t(8, 0), ts("2026-03-01T07:55:00Z")),
            (d(1), Period::Morning)
        );
        assert_eq!(
            rules.occurrence(t(0, 0), ts("2026-03-01T23:55:00Z")),
            (d(2), Period::Night)
        );
        assert_eq!(
            rules.occurrence(t(23, 58), ts("2026-03-02T00:03:00Z")),
            (d(1), Period::Night)
        );
        assert_eq!(
            rules.occurrence(t(18, 0), ts("2026-03-01T17:55:00Z")),
            (d(1), Period::Night)
        );
    }

    #[traced_test]
    #[tokio::test]
    async fn malformed_entry_is_logged_at_warn() {
        let store = Arc::new(InMemoryStore::new());
        store.add_user("u1", recipient("Ada")).await;
        let med = medication("u1", "Ibuprofen", 2, &[("teatime", "16:00")]);
        let id = med.id.clone();
        store.add_medication(med).await;

        let engine = MedicationEngine::new(
            store.clone(),
            Arc::new(RecordingNotifier::new()),
            Templates::new(&NotifierConfig::default(), 0),
            MedicationRules::default(),
        );
        let report = engine.run_pass(ts("2026-03-01T16:00:00Z")).await.unwrap();

        assert_eq!(report.malformed_entries(), 1);
        assert_eq!(report.row(&id).unwrap().outcome, RowOutcome::Unchanged);
        assert!(logs_contain("skipping malformed schedule entry"));
        assert!(logs_contain("teatime"));
    }

    #[test]
    fn from_config_reads_offset_and_tolerance() {
        let config = SchedulerConfig {
            dose_tolerance_secs: 120,
            utc_offset_minutes: -300,
            ..SchedulerConfig::default()
        };
        let rules = MedicationRules::from_config(&config);
        assert_eq!(rules.tolerance_secs, 120);
        assert_eq!(rules.offset.local_minus_utc(), -5 * 3600);
    }
}
