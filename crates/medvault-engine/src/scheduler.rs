// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic driver for the evaluation passes.
//!
//! Each registered [`Pass`] runs on its own interval task. A pass of a
//! given kind never overlaps itself: a tick (or a manual [`Scheduler::run_once`])
//! that finds the previous pass still running is dropped, not queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use medvault_core::{Clock, MedvaultError};

use crate::report::{PassKind, PassReport};

/// One evaluation sweep over a set of rows.
#[async_trait]
pub trait Pass: Send + Sync + 'static {
    fn kind(&self) -> PassKind;

    /// Evaluate every candidate row against `now`.
    ///
    /// Per-row failures belong in the report. An `Err` means no row was
    /// evaluated (the candidate query itself failed).
    async fn run_pass(&self, now: DateTime<Utc>) -> Result<PassReport, MedvaultError>;
}

struct Task {
    pass: Arc<dyn Pass>,
    every: Duration,
    running: AtomicBool,
}

/// Clears the in-progress flag when the pass finishes, panics included.
struct InProgress<'a>(&'a AtomicBool);

impl<'a> InProgress<'a> {
    fn try_begin(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InProgress(flag))
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs registered passes on fixed intervals until cancelled.
pub struct Scheduler {
    clock: Arc<dyn Clock>,
    tasks: Vec<Arc<Task>>,
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            tasks: Vec::new(),
        }
    }

    /// Register `pass` to run every `every`. A second pass of the same kind
    /// replaces the first.
    pub fn with_pass(mut self, pass: Arc<dyn Pass>, every: Duration) -> Self {
        self.tasks.retain(|t| t.pass.kind() != pass.kind());
        self.tasks.push(Arc::new(Task {
            pass,
            every,
            running: AtomicBool::new(false),
        }));
        self
    }

    pub fn kinds(&self) -> Vec<PassKind> {
        self.tasks.iter().map(|t| t.pass.kind()).collect()
    }

    fn task(&self, kind: PassKind) -> Result<&Arc<Task>, MedvaultError> {
        self.tasks
            .iter()
            .find(|t| t.pass.kind() == kind)
            .ok_or_else(|| MedvaultError::Internal(format!("no {kind} pass registered")))
    }

    /// Run one pass of `kind` now.
    ///
    /// Returns `Ok(None)` when a pass of that kind is already in flight.
    pub async fn run_once(&self, kind: PassKind) -> Result<Option<PassReport>, MedvaultError> {
        let task = self.task(kind)?;
        execute(task, self.clock.as_ref()).await
    }

    /// Spawn one interval task per registered pass.
    ///
    /// Each task runs its first pass immediately, then every interval.
    /// Ticks missed while a pass was slow are skipped rather than bunched.
    pub fn spawn(&self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        self.tasks
            .iter()
            .map(|task| {
                let task = Arc::clone(task);
                let clock = Arc::clone(&self.clock);
                let cancel = cancel.clone();
                tokio::spawn(async move { run_task(task, clock, cancel).await })
            })
            .collect()
    }

    /// Run every registered pass until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(passes = ?self.kinds(), "scheduler started");
        for handle in self.spawn(cancel) {
            if let Err(e) = handle.await {
                error!(error = %e, "scheduler task panicked");
            }
        }
        info!("scheduler stopped");
    }
}

async fn execute(task: &Task, clock: &dyn Clock) -> Result<Option<PassReport>, MedvaultError> {
    let kind = task.pass.kind();
    let Some(_guard) = InProgress::try_begin(&task.running) else {
        warn!(%kind, "previous pass still running, skipping");
        return Ok(None);
    };
    let now = clock.now();
    let started = Instant::now();
    let report = match task.pass.run_pass(now).await {
        Ok(report) => report,
        Err(e) => {
            medvault_prometheus::record_pass_error(&kind.to_string());
            return Err(e);
        }
    };
    record_report(&report, started.elapsed());
    if report.failed() > 0 || report.succeeded() > 0 {
        info!(%kind, "{report}");
    } else {
        debug!(%kind, evaluated = report.evaluated(), "pass finished with no changes");
    }
    Ok(Some(report))
}

fn record_report(report: &PassReport, elapsed: Duration) {
    let pass = report.kind.to_string();
    medvault_prometheus::record_rows(&pass, "changed", report.succeeded() as u64);
    medvault_prometheus::record_rows(&pass, "failed", report.failed() as u64);
    medvault_prometheus::record_rows(&pass, "unchanged", report.unchanged() as u64);
    for (_, failure) in report.failures() {
        medvault_prometheus::record_row_failure(&pass, failure.reason());
    }
    medvault_prometheus::record_notifications(&pass, u64::from(report.notifications_sent()));
    medvault_prometheus::record_malformed_entries(&pass, u64::from(report.malformed_entries()));
    medvault_prometheus::record_pass_duration(&pass, elapsed.as_secs_f64());
}

async fn run_task(task: Arc<Task>, clock: Arc<dyn Clock>, cancel: CancellationToken) {
    let kind = task.pass.kind();
    let mut interval = tokio::time::interval(task.every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    debug!(%kind, every_secs = task.every.as_secs(), "pass task started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = execute(&task, clock.as_ref()).await {
                    error!(%kind, error = %e, "pass failed, retrying next tick");
                }
            }
            _ = cancel.cancelled() => {
                info!(%kind, "pass task shutting down");
                break;
            }
        }
    }
}
