//! Operational HTTP handlers, served outside the gate

use crate::api::{HealthResponse, HealthStatus};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use tracing::warn;

fn health_response(state: &AppState) -> HealthResponse {
    let health = state.gate.health();
    HealthResponse {
        status: health.into(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        issues: health.issues().iter().map(|i| i.to_string()).collect(),
    }
}

/// Health check - liveness probe
pub async fn health_live(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health_response(&state))
}

/// Health check - readiness probe; a degraded gate is not ready
pub async fn health_ready(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let response = health_response(&state);
    let status = match response.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => {
            warn!(issues = ?response.issues, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (status, Json(response))
}

/// Prometheus metrics endpoint
pub async fn metrics() -> String {
    crate::metrics::get_prometheus_metrics()
}
