// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `medvault serve`: scheduler plus gateway until a shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use medvault_config::MedvaultConfig;
use medvault_core::{Clock, HealthStatus, MedvaultError, PluginAdapter, SystemClock};
use medvault_engine::build_scheduler;
use medvault_engine::shutdown::install_signal_handler;
use medvault_gateway::{GatewayState, MetricsRender, ServerConfig, start_server};
use medvault_notify::build_notifier;
use medvault_prometheus::PrometheusAdapter;
use medvault_storage::SqliteStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub async fn run_serve(config: MedvaultConfig) -> Result<(), MedvaultError> {
    init_tracing(&config.service.log_level);
    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        "medvault starting"
    );

    let prometheus = if config.metrics.enabled {
        match PrometheusAdapter::new() {
            Ok(adapter) => Some(adapter),
            Err(e) => {
                warn!(error = %e, "prometheus initialization failed, continuing without metrics");
                None
            }
        }
    } else {
        debug!("prometheus metrics disabled by configuration");
        None
    };

    let store = Arc::new(SqliteStore::open(&config.storage).await?);
    let notifier = build_notifier(&config.notifier)?;
    match notifier.health_check().await {
        Ok(HealthStatus::Healthy) => info!(notifier = notifier.name(), "notifier ready"),
        Ok(status) => warn!(notifier = notifier.name(), ?status, "notifier not healthy, sends may fail"),
        Err(e) => warn!(notifier = notifier.name(), error = %e, "notifier health check failed"),
    }
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let cancel = install_signal_handler();

    let mut handles = Vec::new();
    if prometheus.is_some() {
        let every = Duration::from_secs(config.metrics.memory_sample_secs);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move { memory_monitor(every, cancel).await }));
    }

    if config.scheduler.enabled {
        let scheduler = build_scheduler(&config, store.clone(), notifier.clone(), clock.clone());
        info!(
            appointments_every_secs = config.scheduler.appointments_interval_secs,
            medications_every_secs = config.scheduler.medications_interval_secs,
            "scheduler started"
        );
        handles.extend(scheduler.spawn(cancel.clone()));
    } else {
        info!("scheduler disabled");
    }

    let served = if config.gateway.enabled {
        let mut state = GatewayState::new(
            store.clone(),
            clock.clone(),
            config.gateway.join_redirect_url.clone(),
        );
        if let Some(adapter) = &prometheus {
            let handle = adapter.handle().clone();
            let render: MetricsRender = Arc::new(move || handle.render());
            state = state.with_metrics_render(render);
        }
        let result = start_server(&ServerConfig::from(&config.gateway), state, cancel.clone()).await;
        if result.is_err() {
            // Nothing left to serve; stop the passes too.
            cancel.cancel();
        }
        result
    } else {
        cancel.cancelled().await;
        Ok(())
    };

    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "background task panicked");
        }
    }

    if let Err(e) = notifier.shutdown().await {
        warn!(error = %e, "notifier shutdown failed");
    }
    if let Err(e) = store.shutdown().await {
        warn!(error = %e, "store shutdown failed");
    }

    served?;
    info!("medvault serve shutdown complete");
    Ok(())
}

/// Sample jemalloc heap statistics into the memory gauges until cancelled.
#[cfg(not(target_env = "msvc"))]
async fn memory_monitor(every: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                // Stats are cached until the epoch advances.
                if let Err(e) = tikv_jemalloc_ctl::epoch::advance() {
                    warn!(error = %e, "jemalloc epoch advance failed");
                    continue;
                }
                let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
                let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
                medvault_prometheus::set_memory_heap(allocated as f64);
                medvault_prometheus::set_memory_resident(resident as f64);
                debug!(
                    allocated_kb = allocated / 1024,
                    resident_kb = resident / 1024,
                    "heap usage"
                );
            }
            _ = cancel.cancelled() => {
                debug!("memory monitor shutting down");
                break;
            }
        }
    }
}

/// No jemalloc on MSVC; wait for shutdown.
#[cfg(target_env = "msvc")]
async fn memory_monitor(_every: Duration, cancel: CancellationToken) {
    cancel.cancelled().await;
}

/// Initialize tracing. `RUST_LOG` overrides the configured level.
pub(crate) fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("medvault={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
}
