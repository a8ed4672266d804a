// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway: the join links sent in "appointment ongoing" notices land
//! here, plus unauthenticated health and Prometheus endpoints.

pub mod handlers;
pub mod server;

pub use handlers::{ErrorResponse, HealthResponse};
pub use server::{GatewayState, MetricsRender, ServerConfig, router, start_server};
