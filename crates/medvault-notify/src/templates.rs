// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message templates for every transition that notifies.
//!
//! Templates only build [`Notification`] values; delivery is the
//! notifier's job. Times are rendered in the configured local offset.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc};
use medvault_config::model::NotifierConfig;
use medvault_core::MedvaultError;
use medvault_core::types::{
    AppointmentCandidate, Correlation, DoseSlot, MedicationCandidate, Notification,
    NotificationKind, Period,
};

/// Template field holding the footer text.
pub const FIELD_FOOTER: &str = "footer";
/// Template field holding the call-to-action link.
pub const FIELD_ACTION_URL: &str = "action_url";
/// Template field holding the call-to-action label.
pub const FIELD_ACTION_TEXT: &str = "action_text";
pub const FIELD_CURRENT_YEAR: &str = "current_year";

const HUMAN_TIME: &str = "%A, %B %d, %Y at %I:%M %p";
const DEFAULT_DESCRIPTION: &str = "General Checkup";

/// Renders notifications with deployment-specific links and signature.
#[derive(Debug, Clone)]
pub struct Templates {
    signature: String,
    join_link_base: String,
    reschedule_url: String,
    offset: FixedOffset,
}

impl Templates {
    pub fn new(config: &NotifierConfig, utc_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix());
        Self {
            signature: config.signature.clone(),
            join_link_base: config.join_link_base.trim_end_matches('/').to_string(),
            reschedule_url: config.reschedule_url.clone(),
            offset,
        }
    }

    fn local(&self, t: DateTime<Utc>) -> String {
        t.with_timezone(&self.offset).format(HUMAN_TIME).to_string()
    }

    fn base_fields(&self, footer: &str, now: DateTime<Utc>) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        fields.insert(
            FIELD_FOOTER.to_string(),
            format!("{footer}\n\nBest regards,\n{}", self.signature),
        );
        fields.insert(
            FIELD_CURRENT_YEAR.to_string(),
            now.with_timezone(&self.offset).year().to_string(),
        );
        fields
    }

    /// Link that moves an appointment to `Ongoing` when followed.
    pub fn join_link(&self, appointment_id: &str) -> String {
        format!("{}/{appointment_id}", self.join_link_base)
    }

    /// Build the notice for an appointment transition of `kind`.
    ///
    /// Medication kinds are rejected with [`MedvaultError::Internal`].
    pub fn appointment(
        &self,
        kind: NotificationKind,
        candidate: &AppointmentCandidate,
        now: DateTime<Utc>,
    ) -> Result<Notification, MedvaultError> {
        let appt = &candidate.appointment;
        let name = &candidate.recipient.name;
        let description = appt.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION);
        let doctor = candidate.doctor_name.as_deref().unwrap_or("N/A");

        let (subject, body, footer, action) = match kind {
            NotificationKind::AppointmentOngoing => (
                "Your Appointment is Ongoing",
                format!(
                    "Dear {name},\n\n\
                     This is a reminder that your appointment is currently ongoing:\n\n\
                     Description: {description}\n\
                     Started at: {}\n\
                     Doctor: {doctor}\n\n\
                     To join the meeting, please follow the link below:\n",
                    self.local(appt.start_time)
                ),
                "We hope to see you soon!\nIf you have any questions or need assistance \
                 during your appointment, please feel free to contact us.",
                Some((self.join_link(&appt.id), "Join The Meeting")),
            ),
            NotificationKind::AppointmentCompleted => (
                "Appointment Completed",
                format!(
                    "Dear {name},\n\n\
                     We wanted to inform you that your appointment has ended:\n\n\
                     Description: {description}\n\
                     Ended at: {}\n\
                     Doctor: {doctor}\n\n\
                     Thank you for attending your appointment.",
                    self.local(appt.end_time)
                ),
                "We hope your appointment went well! If you have any questions or need \
                 additional help, feel free to contact us.",
                None,
            ),
            NotificationKind::AppointmentMissed => (
                "Missed Appointment",
                format!(
                    "Dear {name},\n\n\
                     It appears that you missed your appointment:\n\n\
                     Description: {description}\n\
                     Scheduled Time: {}\n\
                     Doctor: {doctor}\n\n\
                     We understand that things come up, and we'd be happy to help you \
                     reschedule at your convenience.\n\n\
                     To reschedule your appointment, please follow the link below:\n",
                    self.local(appt.start_time)
                ),
                "We'd love to help you get back on track. Please use the link above to \
                 reschedule. If you need assistance, feel free to contact us.",
                Some((self.reschedule_url.clone(), "Reschedule Your Appointment")),
            ),
            NotificationKind::AppointmentReminder => (
                "Upcoming Appointment Reminder",
                format!(
                    "Dear {name},\n\n\
                     This is a reminder for your upcoming appointment:\n\n\
                     Description: {description}\n\
                     Date & Time: {}\n\
                     Doctor: {doctor}\n\n",
                    self.local(appt.start_time)
                ),
                "Looking forward to seeing you soon!\nPlease arrive 10 minutes before your \
                 scheduled time. If you have any questions or need to reschedule, feel free \
                 to contact us.",
                None,
            ),
            NotificationKind::DoseDue | NotificationKind::CourseCompleted => {
                return Err(MedvaultError::Internal(format!(
                    "{kind:?} is not an appointment notice"
                )));
            }
        };

        let mut fields = self.base_fields(footer, now);
        if let Some((url, text)) = action {
            fields.insert(FIELD_ACTION_URL.to_string(), url);
            fields.insert(FIELD_ACTION_TEXT.to_string(), text.to_string());
        }

        Ok(Notification {
            recipient: candidate.recipient.clone(),
            subject: subject.to_string(),
            body,
            fields,
            correlation: Correlation {
                entity_id: appt.id.clone(),
                kind,
                slot: None,
            },
        })
    }

    /// Dose reminder for one schedule slot.
    ///
    /// `count_left` is the number of doses left before this one is taken.
    pub fn dose_due(
        &self,
        candidate: &MedicationCandidate,
        slot: &DoseSlot,
        count_left: u32,
        day: NaiveDate,
        period: Period,
        now: DateTime<Utc>,
    ) -> Notification {
        let med = &candidate.medication;
        let scheduled = slot.time.format("%I:%M %p");
        let body = format!(
            "Hey {},\n\n\
             It's time to take your {}!\n\n\
             Scheduled Time: {scheduled}\n\
             Count Left: {count_left}\n\n\
             Don't forget, taking your meds is important!\n\n\
             Cheers to good health!",
            candidate.recipient.name, med.name
        );
        Notification {
            recipient: candidate.recipient.clone(),
            subject: format!("Time to Take Your Medication: {}", med.name),
            body,
            fields: self.base_fields(
                "Stay healthy and keep smiling! Remember, laughter is the best medicine, \
                 but don't skip the actual medicine!",
                now,
            ),
            correlation: Correlation {
                entity_id: med.id.clone(),
                kind: NotificationKind::DoseDue,
                slot: Some(format!("{day}/{period}/{}", slot.time.format("%H:%M"))),
            },
        }
    }

    /// Congratulations once the last dose went out.
    pub fn course_completed(
        &self,
        candidate: &MedicationCandidate,
        now: DateTime<Utc>,
    ) -> Notification {
        let med = &candidate.medication;
        let body = format!(
            "Congratulations, {}!\n\n\
             You've successfully completed your course of {}!\n\n\
             They say good things come to those who wait, but great things come to those \
             who take their medication!\n\n\
             Cheers to your health and well-being!",
            candidate.recipient.name, med.name
        );
        Notification {
            recipient: candidate.recipient.clone(),
            subject: format!("Congrats on Completing Your Medication: {}!", med.name),
            body,
            fields: self.base_fields(
                "Keep up the great work, and remember, taking care of yourself is a \
                 lifelong adventure!",
                now,
            ),
            correlation: Correlation {
                entity_id: med.id.clone(),
                kind: NotificationKind::CourseCompleted,
                slot: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime, TimeZone};
    use medvault_core::types::{Appointment, Medication, Recipient, ScheduleEntry};

    fn templates() -> Templates {
        let config = NotifierConfig {
            join_link_base: "https://care.example.org/join_appointment/".into(),
            reschedule_url: "https://care.example.org/reschedule".into(),
            ..NotifierConfig::default()
        };
        Templates::new(&config, 60)
    }

    fn appointment_candidate() -> AppointmentCandidate {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        AppointmentCandidate {
            appointment: Appointment::new(
                "u1",
                Some("d1".into()),
                start,
                start + Duration::hours(1),
                None,
            )
            .unwrap(),
            recipient: Recipient {
                email: "ada@example.org".into(),
                name: "Ada".into(),
            },
            doctor_name: Some("Dr. Grey".into()),
        }
    }

    #[test]
    fn reminder_renders_local_time_and_defaults() {
        let c = appointment_candidate();
        let now = c.appointment.start_time - Duration::minutes(10);
        let n = templates()
            .appointment(NotificationKind::AppointmentReminder, &c, now)
            .unwrap();

        assert_eq!(n.subject, "Upcoming Appointment Reminder");
        assert!(n.body.contains("Dear Ada"));
        assert!(n.body.contains("General Checkup"));
        assert!(n.body.contains("Doctor: Dr. Grey"));
        // 09:00 UTC at +01:00
        assert!(n.body.contains("Monday, March 02, 2026 at 10:00 AM"), "{}", n.body);
        assert!(n.fields[FIELD_FOOTER].ends_with("The HealthCare Team"));
        assert_eq!(n.fields[FIELD_CURRENT_YEAR], "2026");
        assert!(!n.fields.contains_key(FIELD_ACTION_URL));
        assert_eq!(n.correlation.kind, NotificationKind::AppointmentReminder);
    }

    #[test]
    fn medication_kinds_are_not_appointment_notices() {
        let c = appointment_candidate();
        let now = c.appointment.start_time;
        for kind in [NotificationKind::DoseDue, NotificationKind::CourseCompleted] {
            assert!(matches!(
                templates().appointment(kind, &c, now),
                Err(MedvaultError::Internal(_))
            ));
        }
    }

    #[test]
    fn ongoing_carries_join_link() {
        let c = appointment_candidate();
        let n = templates().appointment(
            NotificationKind::AppointmentOngoing,
            &c,
            c.appointment.start_time,
        )
        .unwrap();
        assert_eq!(n.subject, "Your Appointment is Ongoing");
        assert_eq!(
            n.fields[FIELD_ACTION_URL],
            format!("https://care.example.org/join_appointment/{}", c.appointment.id)
        );
        assert_eq!(n.fields[FIELD_ACTION_TEXT], "Join The Meeting");
    }

    #[test]
    fn missed_links_to_reschedule() {
        let c = appointment_candidate();
        let n = templates().appointment(
            NotificationKind::AppointmentMissed,
            &c,
            c.appointment.end_time + Duration::minutes(5),
        )
        .unwrap();
        assert_eq!(n.subject, "Missed Appointment");
        assert_eq!(n.fields[FIELD_ACTION_URL], "https://care.example.org/reschedule");
        assert_eq!(n.fields[FIELD_ACTION_TEXT], "Reschedule Your Appointment");
    }

    #[test]
    fn dose_correlation_names_day_period_and_slot() {
        let med = Medication::new(
            "u1",
            "Amoxicillin",
            4,
            vec![ScheduleEntry::new("morning", "08:30")],
        )
        .unwrap();
        let c = MedicationCandidate {
            medication: med,
            recipient: Recipient {
                email: "ada@example.org".into(),
                name: "Ada".into(),
            },
        };
        let slot = DoseSlot {
            period: Period::Morning,
            time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
        };
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 31, 0).unwrap();
        let n = templates().dose_due(&c, &slot, 4, day, Period::Morning, now);

        assert_eq!(n.subject, "Time to Take Your Medication: Amoxicillin");
        assert!(n.body.contains("Scheduled Time: 08:30 AM"));
        assert!(n.body.contains("Count Left: 4"));
        assert_eq!(n.correlation.slot.as_deref(), Some("2026-03-02/morning/08:30"));

        let done = templates().course_completed(&c, now);
        assert_eq!(done.subject, "Congrats on Completing Your Medication: Amoxicillin!");
        assert_eq!(done.correlation.kind, NotificationKind::CourseCompleted);
    }
}
