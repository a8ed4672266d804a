// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-row outcomes and pass summaries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

/// Which recurring pass produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PassKind {
    Appointments,
    Medications,
}

/// Why a row did not reach its intended state this pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum RowFailure {
    /// The notifier rejected a message; the row was left for the next pass.
    Notify(String),
    /// Reading or writing the row failed.
    Storage(String),
    /// The row changed underneath the pass and the guarded write matched nothing.
    Conflict,
}

impl RowFailure {
    /// Stable label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            RowFailure::Notify(_) => "notify",
            RowFailure::Storage(_) => "storage",
            RowFailure::Conflict => "conflict",
        }
    }
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowFailure::Notify(msg) => write!(f, "notify: {msg}"),
            RowFailure::Storage(msg) => write!(f, "storage: {msg}"),
            RowFailure::Conflict => f.write_str("conflict"),
        }
    }
}

/// Result of evaluating one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    /// No rule applied.
    Unchanged,
    /// The row was committed in a new state.
    Changed { from: String, to: String },
    /// Something went wrong. Progress made before the failure may still
    /// have been committed (a dose sent before a later dose failed).
    Failed { failure: RowFailure },
}

/// One evaluated row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowReport {
    pub entity_id: String,
    #[serde(flatten)]
    pub outcome: RowOutcome,
    /// Messages the notifier accepted for this row.
    pub notifications_sent: u32,
    /// Schedule entries skipped because they did not parse.
    pub malformed_entries: u32,
}

impl RowReport {
    pub fn unchanged(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            outcome: RowOutcome::Unchanged,
            notifications_sent: 0,
            malformed_entries: 0,
        }
    }

    pub fn changed(
        entity_id: impl Into<String>,
        from: impl ToString,
        to: impl ToString,
        notifications_sent: u32,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            outcome: RowOutcome::Changed {
                from: from.to_string(),
                to: to.to_string(),
            },
            notifications_sent,
            malformed_entries: 0,
        }
    }

    pub fn failed(entity_id: impl Into<String>, failure: RowFailure) -> Self {
        Self {
            entity_id: entity_id.into(),
            outcome: RowOutcome::Failed { failure },
            notifications_sent: 0,
            malformed_entries: 0,
        }
    }

    pub fn with_malformed(mut self, count: u32) -> Self {
        self.malformed_entries = count;
        self
    }

    pub fn with_sent(mut self, count: u32) -> Self {
        self.notifications_sent = count;
        self
    }

    pub fn failure(&self) -> Option<&RowFailure> {
        match &self.outcome {
            RowOutcome::Failed { failure } => Some(failure),
            _ => None,
        }
    }
}

/// Everything one pass did, in evaluation order.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub kind: PassKind,
    /// The single `now` the whole pass was evaluated against.
    pub now: DateTime<Utc>,
    pub rows: Vec<RowReport>,
}

impl PassReport {
    pub fn new(kind: PassKind, now: DateTime<Utc>) -> Self {
        Self {
            kind,
            now,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: RowReport) {
        self.rows.push(row);
    }

    pub fn evaluated(&self) -> usize {
        self.rows.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Changed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Failed { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Unchanged))
    }

    pub fn notifications_sent(&self) -> u32 {
        self.rows.iter().map(|r| r.notifications_sent).sum()
    }

    pub fn malformed_entries(&self) -> u32 {
        self.rows.iter().map(|r| r.malformed_entries).sum()
    }

    /// `(entity_id, failure)` for every failed row.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &RowFailure)> {
        self.rows
            .iter()
            .filter_map(|r| r.failure().map(|f| (r.entity_id.as_str(), f)))
    }

    pub fn row(&self, entity_id: &str) -> Option<&RowReport> {
        self.rows.iter().find(|r| r.entity_id == entity_id)
    }

    fn count(&self, pred: impl Fn(&RowOutcome) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.outcome)).count()
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pass at {}: {} evaluated, {} succeeded, {} failed, {} unchanged, {} sent",
            self.kind,
            self.now.format("%Y-%m-%d %H:%M:%S UTC"),
            self.evaluated(),
            self.succeeded(),
            self.failed(),
            self.unchanged(),
            self.notifications_sent(),
        )?;
        let malformed = self.malformed_entries();
        if malformed > 0 {
            write!(f, ", {malformed} malformed schedule entries skipped")?;
        }
        for (id, failure) in self.failures() {
            write!(f, "\n  {id}: {failure}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn report() -> PassReport {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let mut r = PassReport::new(PassKind::Appointments, now);
        r.push(RowReport::changed("a1", "Upcoming", "30mins_Notified", 1));
        r.push(RowReport::changed("a2", "Notified", "Missed", 1));
        r.push(RowReport::changed("a3", "Ongoing", "Completed", 1));
        r.push(RowReport::failed("a4", RowFailure::Notify("550 mailbox".into())));
        r.push(RowReport::unchanged("a5"));
        r
    }

    #[test]
    fn counts_by_outcome() {
        let r = report();
        assert_eq!(r.evaluated(), 5);
        assert_eq!(r.succeeded(), 3);
        assert_eq!(r.failed(), 1);
        assert_eq!(r.unchanged(), 1);
        assert_eq!(r.notifications_sent(), 3);
        let failures: Vec<_> = r.failures().collect();
        assert_eq!(failures, vec![("a4", &RowFailure::Notify("550 mailbox".into()))]);
    }

    #[test]
    fn display_lists_failures() {
        let text = report().to_string();
        assert!(text.starts_with("appointments pass at 2026-03-01 10:00:00 UTC"));
        assert!(text.contains("3 succeeded, 1 failed"));
        assert!(text.contains("a4: notify: 550 mailbox"));
    }

    #[test]
    fn serializes_flat_rows() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["kind"], "appointments");
        assert_eq!(json["rows"][0]["outcome"], "changed");
        assert_eq!(json["rows"][0]["to"], "30mins_Notified");
        assert_eq!(json["rows"][3]["failure"]["reason"], "notify");
    }
}
