//! Health and readiness endpoints.

use super::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

/// Health response body.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, degraded, or unhealthy
    pub status: String,
    /// Individual component checks
    pub checks: Vec<ComponentHealth>,
}

/// Per-component health entry.
#[derive(Serialize)]
pub struct ComponentHealth {
    /// Component name
    pub component: String,
    /// Component status
    pub status: String,
    /// Optional detail message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness/health check.
///
/// Reports the clock store and settlement delivery status. Degraded (e.g.
/// deferred settlements waiting for an operator) still returns 200 so load
/// balancers keep routing; unhealthy returns 503.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let report = state.engine.health().await;

    let status_code = if report.status.is_unhealthy() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    let response = HealthResponse {
        status: report.status.to_string(),
        checks: report
            .checks
            .into_iter()
            .map(|check| ComponentHealth {
                component: check.component,
                status: check.status.to_string(),
                message: check.message,
            })
            .collect(),
    };

    (status_code, Json(response))
}

/// Readiness check.
pub async fn readiness_check() -> StatusCode {
    StatusCode::OK
}
