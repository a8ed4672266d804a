// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.
//!
//! Handles the two join routes, GET /health and GET /metrics.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, info};

use medvault_core::MedvaultError;
use medvault_engine::join_appointment;

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Binary version.
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub msg: String,
}

/// A join failure mapped onto an HTTP status and error body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, error: &str, msg: &str) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.to_string(),
                msg: msg.to_string(),
            },
        }
    }
}

impl From<MedvaultError> for ApiError {
    fn from(err: MedvaultError) -> Self {
        match err {
            MedvaultError::NotFound { .. } => ApiError::new(
                StatusCode::NOT_FOUND,
                "APPOINTMENT_NOT_FOUND",
                "Appointment not found.",
            ),
            MedvaultError::InvalidTransition { .. } => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_APPOINTMENT_STATUS",
                "Appointment is either not ongoing or has a different status.",
            ),
            other => {
                error!(error = %other, "join failed");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Something went wrong. Please try again later.",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

async fn join_and_redirect(
    state: &GatewayState,
    id: &str,
    role: &'static str,
) -> Result<Response, ApiError> {
    let now = state.clock.now();
    join_appointment(state.store.as_ref(), id, now).await?;
    info!(appointment_id = id, role, "participant joined");
    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, state.join_redirect_url.clone())],
    )
        .into_response())
}

/// GET /join_appointment/{id}
///
/// Moves a reminded or notified appointment to `Ongoing` and redirects
/// to the appointments page.
pub async fn join(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    join_and_redirect(&state, &id, "patient").await
}

/// GET /doctor/join_appointment/{id}
pub async fn doctor_join(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    join_and_redirect(&state, &id, "doctor").await
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
///
/// Prometheus text format, or 404 when metrics are disabled.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.metrics_render {
        Some(render) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_mapping() {
        let not_found: ApiError = MedvaultError::NotFound {
            entity: "appointment",
            id: "x".into(),
        }
        .into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.body.error, "APPOINTMENT_NOT_FOUND");

        let invalid: ApiError = MedvaultError::InvalidTransition {
            id: "x".into(),
            status: "Upcoming".into(),
        }
        .into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.body.error, "INVALID_APPOINTMENT_STATUS");

        let internal: ApiError = MedvaultError::storage(std::io::Error::other("locked")).into();
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!internal.body.msg.contains("locked"));
    }
}
