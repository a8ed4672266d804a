// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics for Medvault.
//!
//! Pass outcomes are recorded through the metrics-rs facade, so recording
//! is a no-op until [`PrometheusAdapter::new`] installs the exporter. The
//! gateway serves [`PrometheusAdapter::render`] at `/metrics`.

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use medvault_core::types::{AdapterType, HealthStatus};
use medvault_core::{MedvaultError, PluginAdapter};

pub use recording::{
    record_malformed_entries, record_notifications, record_pass_duration, record_pass_error,
    record_row_failure, record_rows, set_memory_heap, set_memory_resident,
};

/// Owns the installed Prometheus recorder.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Install the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn new() -> Result<Self, MedvaultError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            MedvaultError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, MedvaultError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MedvaultError> {
        Ok(())
    }
}
