// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use medvault_config::model::GatewayConfig;
use medvault_core::{AppointmentStore, Clock, MedvaultError};

use crate::handlers;

/// Renders the Prometheus text exposition.
pub type MetricsRender = Arc<dyn Fn() -> String + Send + Sync>;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<dyn AppointmentStore>,
    pub clock: Arc<dyn Clock>,
    /// Where a successful join sends the browser.
    pub join_redirect_url: String,
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Backs GET /metrics; `None` when metrics are disabled.
    pub metrics_render: Option<MetricsRender>,
}

impl GatewayState {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        clock: Arc<dyn Clock>,
        join_redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            join_redirect_url: join_redirect_url.into(),
            start_time: std::time::Instant::now(),
            metrics_render: None,
        }
    }

    pub fn with_metrics_render(mut self, render: MetricsRender) -> Self {
        self.metrics_render = Some(render);
        self
    }
}

/// Bind address for the gateway.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// All gateway routes with their middleware.
///
/// - GET /join_appointment/{id}
/// - GET /doctor/join_appointment/{id}
/// - GET /health
/// - GET /metrics
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/join_appointment/{id}", get(handlers::join))
        .route("/doctor/join_appointment/{id}", get(handlers::doctor_join))
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until `cancel` fires, then drain in-flight requests.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), MedvaultError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MedvaultError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| MedvaultError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use medvault_core::SystemClock;
    use medvault_test_utils::InMemoryStore;

    #[test]
    fn server_config_from_gateway_config() {
        let config = ServerConfig::from(&GatewayConfig::default());
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
    }

    #[tokio::test]
    async fn server_stops_on_cancel() {
        let state = GatewayState::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(SystemClock),
            "http://localhost/appointments",
        );
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        };
        let cancel = CancellationToken::new();
        let server = tokio::spawn({
            let cancel = cancel.clone();
            async move { start_server(&config, state, cancel).await }
        });
        cancel.cancel();
        server.await.unwrap().unwrap();
    }
}
