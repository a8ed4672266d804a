// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end passes through the scheduler against a real SQLite store.

use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate};
use tokio_util::sync::CancellationToken;

use medvault_core::types::{AppointmentStatus, MedicationStatus, NotificationKind, Period};
use medvault_core::{AppointmentStore, MedvaultError};
use medvault_engine::{PassKind, build_scheduler, join_appointment};
use medvault_test_utils::TestHarness;
use medvault_test_utils::fixtures::{appointment, medication, ts};

#[tokio::test]
async fn appointment_pass_reminds_and_persists() {
    let now = ts("2026-03-01T10:00:00Z");
    let h = TestHarness::at(now).await.unwrap();
    h.seed_user("u1", "Ada").await.unwrap();
    h.seed_doctor("d1", "Dr. Grey").await.unwrap();
    let mut appt = appointment("u1", now + Duration::minutes(10), 60);
    appt.doctor_id = Some("d1".into());
    h.seed_appointment(&appt).await.unwrap();

    let scheduler = build_scheduler(&h.config, h.store.clone(), h.notifier.clone(), h.clock.clone());
    let report = scheduler
        .run_once(PassKind::Appointments)
        .await
        .unwrap()
        .expect("no pass in flight");

    assert_eq!(report.now, now);
    assert_eq!(report.succeeded(), 1);
    let stored = h.store.get_appointment(&appt.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::ThirtyMinsNotified);
    let sent = h.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Upcoming Appointment Reminder");
    assert!(sent[0].body.contains("Dr. Grey"));
}

#[tokio::test]
async fn notified_after_end_becomes_missed() {
    let now = ts("2026-03-01T10:00:00Z");
    let h = TestHarness::at(now).await.unwrap();
    h.seed_user("u1", "Ada").await.unwrap();
    let mut appt = appointment("u1", now - Duration::minutes(65), 60);
    appt.status = AppointmentStatus::Notified;
    h.seed_appointment(&appt).await.unwrap();

    let scheduler = build_scheduler(&h.config, h.store.clone(), h.notifier.clone(), h.clock.clone());
    scheduler.run_once(PassKind::Appointments).await.unwrap();

    let stored = h.store.get_appointment(&appt.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Missed);
    assert_eq!(h.notifier.sent_of(NotificationKind::AppointmentMissed).await.len(), 1);
}

#[tokio::test]
async fn join_against_sqlite_is_guarded() {
    let now = ts("2026-03-01T10:00:00Z");
    let h = TestHarness::at(now).await.unwrap();
    h.seed_user("u1", "Ada").await.unwrap();
    let mut appt = appointment("u1", now + Duration::minutes(30), 30);
    appt.status = AppointmentStatus::Notified;
    h.seed_appointment(&appt).await.unwrap();

    let err = join_appointment(h.store.as_ref(), &appt.id, now)
        .await
        .unwrap_err();
    assert!(matches!(err, MedvaultError::InvalidTransition { .. }));
    let stored = h.store.get_appointment(&appt.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Notified);

    join_appointment(h.store.as_ref(), &appt.id, now + Duration::minutes(31))
        .await
        .unwrap();
    let stored = h.store.get_appointment(&appt.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Ongoing);
}

#[tokio::test]
async fn medication_course_runs_to_completion() {
    let h = TestHarness::at(ts("2026-03-01T08:03:00Z")).await.unwrap();
    h.seed_user("u1", "Ada").await.unwrap();
    let med = medication("u1", "Amoxicillin", 2, &[("morning", "08:00"), ("night", "20:00")]);
    h.seed_medication(&med).await.unwrap();

    let scheduler = build_scheduler(&h.config, h.store.clone(), h.notifier.clone(), h.clock.clone());
    scheduler.run_once(PassKind::Medications).await.unwrap();
    let stored = h.store.get_medication(&med.id).await.unwrap().unwrap();
    assert_eq!(stored.count_left, 1);
    assert_eq!(stored.status, MedicationStatus::Ongoing);
    assert_eq!(stored.last_sent_on, NaiveDate::from_ymd_opt(2026, 3, 1));
    assert_eq!(stored.last_sent_period, Some(Period::Morning));

    // Twenty seconds later the marker holds.
    h.clock.advance(Duration::seconds(20));
    scheduler.run_once(PassKind::Medications).await.unwrap();
    assert_eq!(h.notifier.sent_count().await, 1);

    h.clock.set(ts("2026-03-01T20:05:00Z"));
    scheduler.run_once(PassKind::Medications).await.unwrap();
    let stored = h.store.get_medication(&med.id).await.unwrap().unwrap();
    assert_eq!(stored.count_left, 0);
    assert_eq!(stored.status, MedicationStatus::Completed);
    assert_eq!(
        h.notifier.sent_of(NotificationKind::CourseCompleted).await.len(),
        1
    );
}

#[tokio::test]
async fn malformed_stored_schedule_does_not_block_valid_rows() {
    let h = TestHarness::at(ts("2026-03-01T13:00:00Z")).await.unwrap();
    h.seed_user("u1", "Ada").await.unwrap();
    let broken = medication("u1", "Broken", 3, &[("afternoon", "13:00")]);
    let fine = medication("u1", "Fine", 3, &[("afternoon", "13:00")]);
    h.seed_medication(&broken).await.unwrap();
    h.seed_medication(&fine).await.unwrap();
    h.store
        .set_raw_schedule(&broken.id, "[{\"when\":\"afternoon\"}]")
        .await
        .unwrap();

    let scheduler = build_scheduler(&h.config, h.store.clone(), h.notifier.clone(), h.clock.clone());
    let report = scheduler.run_once(PassKind::Medications).await.unwrap().unwrap();
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.malformed_entries(), 1);
    let stored = h.store.get_medication(&fine.id).await.unwrap().unwrap();
    assert_eq!(stored.count_left, 2);
    let stored = h.store.get_medication(&broken.id).await.unwrap().unwrap();
    assert_eq!(stored.count_left, 3);
}

#[tokio::test]
async fn spawned_tasks_stop_on_cancel() {
    let h = TestHarness::at(ts("2026-03-01T10:00:00Z")).await.unwrap();
    let scheduler = build_scheduler(&h.config, h.store.clone(), h.notifier.clone(), h.clock.clone());
    assert_eq!(
        scheduler.kinds(),
        vec![PassKind::Appointments, PassKind::Medications]
    );

    let cancel = CancellationToken::new();
    let handles = scheduler.spawn(cancel.clone());
    tokio::time::sleep(StdDuration::from_millis(50)).await;
    cancel.cancel();
    for handle in handles {
        tokio::time::timeout(StdDuration::from_secs(5), handle)
            .await
            .expect("task did not stop")
            .unwrap();
    }
}
