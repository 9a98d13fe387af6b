//! Gateway health endpoint.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub uptime_seconds: u64,
    pub provider: String,
    pub model: String,
    pub sessions: usize,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok".into(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        provider: state.client.provider_name().to_string(),
        model: state.client.model_id().to_string(),
        sessions: state.sessions.len().await,
        timestamp: Utc::now(),
    })
}
