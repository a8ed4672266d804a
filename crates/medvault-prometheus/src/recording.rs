// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Every pass metric carries a `pass` label (`appointments` or
//! `medications`).

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Medvault metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "medvault_rows_total",
        "Rows evaluated, by pass and outcome (changed, failed, unchanged)"
    );
    describe_counter!(
        "medvault_row_failures_total",
        "Failed rows, by pass and reason (notify, storage, conflict)"
    );
    describe_counter!(
        "medvault_notifications_sent_total",
        "Notifications the notifier accepted"
    );
    describe_counter!(
        "medvault_malformed_schedule_entries_total",
        "Schedule entries skipped because they did not parse"
    );
    describe_counter!(
        "medvault_pass_errors_total",
        "Passes that failed before evaluating any row"
    );
    describe_histogram!("medvault_pass_duration_seconds", "Wall time of one pass");
    describe_gauge!("medvault_memory_heap_bytes", "Bytes allocated on the heap");
    describe_gauge!(
        "medvault_memory_resident_bytes",
        "Bytes in physically resident allocator pages"
    );
}

pub fn record_rows(pass: &str, outcome: &'static str, count: u64) {
    if count > 0 {
        metrics::counter!("medvault_rows_total", "pass" => pass.to_string(), "outcome" => outcome)
            .increment(count);
    }
}

pub fn record_row_failure(pass: &str, reason: &'static str) {
    metrics::counter!("medvault_row_failures_total", "pass" => pass.to_string(), "reason" => reason)
        .increment(1);
}

pub fn record_notifications(pass: &str, count: u64) {
    if count > 0 {
        metrics::counter!("medvault_notifications_sent_total", "pass" => pass.to_string())
            .increment(count);
    }
}

pub fn record_malformed_entries(pass: &str, count: u64) {
    if count > 0 {
        metrics::counter!("medvault_malformed_schedule_entries_total", "pass" => pass.to_string())
            .increment(count);
    }
}

pub fn record_pass_error(pass: &str) {
    metrics::counter!("medvault_pass_errors_total", "pass" => pass.to_string()).increment(1);
}

pub fn record_pass_duration(pass: &str, seconds: f64) {
    metrics::histogram!("medvault_pass_duration_seconds", "pass" => pass.to_string())
        .record(seconds);
}

pub fn set_memory_heap(bytes: f64) {
    metrics::gauge!("medvault_memory_heap_bytes").set(bytes);
}

pub fn set_memory_resident(bytes: f64) {
    metrics::gauge!("medvault_memory_resident_bytes").set(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    /// Value of the first sample of `name` whose labels include every pair.
    fn sample(rendered: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        rendered
            .lines()
            .filter(|l| !l.starts_with('#'))
            .filter(|l| l.starts_with(&format!("{name}{{")) || l.starts_with(&format!("{name} ")))
            .find(|l| {
                labels
                    .iter()
                    .all(|(k, v)| l.contains(&format!("{k}=\"{v}\"")))
            })
            .and_then(|l| l.rsplit(' ').next())
            .and_then(|v| v.parse().ok())
    }

    fn render_with(record: impl FnOnce()) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            register_metrics();
            record();
        });
        handle.render()
    }

    #[test]
    fn rows_are_labelled_by_pass_and_outcome() {
        let rendered = render_with(|| {
            record_rows("medications", "changed", 2);
            record_rows("medications", "changed", 1);
            record_rows("appointments", "unchanged", 4);
            record_rows("appointments", "failed", 0);
        });
        assert_eq!(
            sample(&rendered, "medvault_rows_total", &[("pass", "medications"), ("outcome", "changed")]),
            Some(3.0)
        );
        assert_eq!(
            sample(&rendered, "medvault_rows_total", &[("pass", "appointments"), ("outcome", "unchanged")]),
            Some(4.0)
        );
        assert_eq!(
            sample(&rendered, "medvault_rows_total", &[("outcome", "failed")]),
            None,
            "zero counts create no series"
        );
    }

    #[test]
    fn failures_carry_their_reason() {
        let rendered = render_with(|| {
            record_row_failure("appointments", "notify");
            record_row_failure("appointments", "notify");
            record_row_failure("medications", "conflict");
        });
        assert_eq!(
            sample(&rendered, "medvault_row_failures_total", &[("pass", "appointments"), ("reason", "notify")]),
            Some(2.0)
        );
        assert_eq!(
            sample(&rendered, "medvault_row_failures_total", &[("pass", "medications"), ("reason", "conflict")]),
            Some(1.0)
        );
    }

    #[test]
    fn pass_duration_is_a_distribution() {
        let rendered = render_with(|| {
            record_pass_duration("medications", 0.25);
            record_pass_duration("medications", 0.75);
        });
        assert_eq!(
            sample(&rendered, "medvault_pass_duration_seconds_count", &[("pass", "medications")]),
            Some(2.0)
        );
        assert_eq!(
            sample(&rendered, "medvault_pass_duration_seconds_sum", &[("pass", "medications")]),
            Some(1.0)
        );
    }

    #[test]
    fn memory_gauges_hold_the_last_sample() {
        let rendered = render_with(|| {
            set_memory_heap(1024.0);
            set_memory_heap(2048.0);
            set_memory_resident(4096.0);
        });
        assert_eq!(sample(&rendered, "medvault_memory_heap_bytes", &[]), Some(2048.0));
        assert_eq!(sample(&rendered, "medvault_memory_resident_bytes", &[]), Some(4096.0));
        assert!(rendered.contains("# HELP medvault_memory_heap_bytes"), "{rendered}");
    }
}
