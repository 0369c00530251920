//! Health check handlers.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::state::AppState;
use crate::tracker::HealthStatus;

#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
}

pub async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "Tokenmint access token server".to_string(),
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.health.uptime_seconds(),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub service_account_email: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub consecutive_failures: u64,
    pub success_rate: Option<f64>,
    pub last_success: Option<DateTime<Utc>>,
    pub issues: Vec<String>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.health.snapshot();
    let mut issues = snapshot.issues();

    let (status, service_account_email) = if state.credential.is_complete() {
        (snapshot.status(), Some(state.credential.client_email.clone()))
    } else {
        issues.insert(0, "No service account credentials".to_string());
        (HealthStatus::Unhealthy, None)
    };

    Json(HealthResponse {
        status,
        service_account_email,
        timestamp: Utc::now(),
        started_at: snapshot.started_at,
        uptime_seconds: snapshot.uptime_seconds,
        total_requests: snapshot.total_requests,
        successful_requests: snapshot.successful_requests,
        consecutive_failures: snapshot.consecutive_failures,
        success_rate: snapshot.success_rate(),
        last_success: snapshot.last_success,
        issues,
    })
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub google_reachable: bool,
}

pub async fn readiness(State(state): State<Arc<AppState>>) -> Json<ReadinessResponse> {
    let reachable = state.probe.is_reachable().await;
    debug!(reachable, "Readiness probe completed");

    Json(ReadinessResponse {
        status: if reachable { "ready" } else { "not_ready" }.to_string(),
        google_reachable: reachable,
    })
}

#[derive(Serialize)]
pub struct LivenessResponse {
    pub status: String,
    pub uptime_seconds: u64,
}

pub async fn liveness(State(state): State<Arc<AppState>>) -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
        uptime_seconds: state.health.uptime_seconds(),
    })
}
