//! Health check endpoints.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::otp::OtpStatsSnapshot;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Basic health check (is the server running?)
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct ReadyResponse {
    status: &'static str,
    active_codes: usize,
}

/// Readiness check. The store is in-process, so being up means being ready.
pub async fn ready_check(State(state): State<AppState>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        status: "ready",
        active_codes: state.otp.active_records(),
    })
}

#[derive(Serialize)]
pub struct MetricsResponse {
    uptime_secs: u64,
    otp: OtpStatsSnapshot,
}

/// Metrics endpoint (for monitoring)
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        uptime_secs: state.started_at.elapsed().as_secs(),
        otp: state.otp.get_stats(),
    })
}
