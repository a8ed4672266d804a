// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route-level tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::Duration;
use tower::ServiceExt;

use medvault_core::types::AppointmentStatus;
use medvault_gateway::{GatewayState, router};
use medvault_test_utils::fixtures::{appointment, ts};
use medvault_test_utils::{FixedClock, InMemoryStore};

const REDIRECT: &str = "http://127.0.0.1:3000/appointments";

async fn state_with(store: Arc<InMemoryStore>) -> GatewayState {
    let clock = Arc::new(FixedClock::new(ts("2026-03-01T10:00:00Z")));
    GatewayState::new(store, clock, REDIRECT)
}

async fn seed(store: &InMemoryStore, minutes_from_now: i64, status: AppointmentStatus) -> String {
    let mut a = appointment(
        "u1",
        ts("2026-03-01T10:00:00Z") + Duration::minutes(minutes_from_now),
        30,
    );
    a.status = status;
    let id = a.id.clone();
    store.add_appointment(a).await;
    id
}

async fn get(state: GatewayState, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    (status, headers, body.to_vec())
}

#[tokio::test]
async fn join_redirects_and_marks_ongoing() {
    let store = Arc::new(InMemoryStore::new());
    let id = seed(&store, -5, AppointmentStatus::Notified).await;

    let (status, headers, _) = get(state_with(store.clone()).await, &format!("/join_appointment/{id}")).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], REDIRECT);
    assert_eq!(
        store.appointment(&id).await.unwrap().status,
        AppointmentStatus::Ongoing
    );
}

#[tokio::test]
async fn doctor_route_behaves_the_same() {
    let store = Arc::new(InMemoryStore::new());
    let id = seed(&store, -5, AppointmentStatus::ThirtyMinsNotified).await;

    let (status, _, _) = get(
        state_with(store.clone()).await,
        &format!("/doctor/join_appointment/{id}"),
    )
    .await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        store.appointment(&id).await.unwrap().status,
        AppointmentStatus::Ongoing
    );
}

#[tokio::test]
async fn join_outside_window_is_400_and_leaves_row() {
    let store = Arc::new(InMemoryStore::new());
    let id = seed(&store, 60, AppointmentStatus::Notified).await;

    let (status, _, body) = get(state_with(store.clone()).await, &format!("/join_appointment/{id}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "INVALID_APPOINTMENT_STATUS");
    assert_eq!(
        json["msg"],
        "Appointment is either not ongoing or has a different status."
    );
    assert_eq!(
        store.appointment(&id).await.unwrap().status,
        AppointmentStatus::Notified
    );
}

#[tokio::test]
async fn unknown_appointment_is_404() {
    let store = Arc::new(InMemoryStore::new());
    let (status, _, body) = get(state_with(store).await, "/join_appointment/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "APPOINTMENT_NOT_FOUND");
    assert_eq!(json["msg"], "Appointment not found.");
}

#[tokio::test]
async fn storage_failure_is_500() {
    let store = Arc::new(InMemoryStore::new());
    store.fail_reads(true).await;
    let (status, _, body) = get(state_with(store).await, "/join_appointment/any").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "INTERNAL_SERVER_ERROR");
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, _, body) = get(state_with(Arc::new(InMemoryStore::new())).await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["uptime_secs"].is_u64());
}

#[tokio::test]
async fn metrics_route_serves_the_render_output() {
    let state = state_with(Arc::new(InMemoryStore::new()))
        .await
        .with_metrics_render(Arc::new(|| "medvault_rows_total{pass=\"medications\"} 1\n".to_string()));
    let (status, headers, body) = get(state, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "medvault_rows_total{pass=\"medications\"} 1\n"
    );
}

#[tokio::test]
async fn metrics_route_is_absent_when_disabled() {
    let (status, _, _) = get(state_with(Arc::new(InMemoryStore::new())).await, "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
