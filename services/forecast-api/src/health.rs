//! Health check endpoints for load balancers and monitoring

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use data_retrieval::SourceHealth;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::AppState;

/// Basic health check - fast, no external dependencies
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Source health, run counters and uptime.
/// Answers 503 when no history source is currently healthy.
pub async fn health_detail(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<DetailedHealthResponse>) {
    let sources = state.retriever.health_check().await;
    let any_healthy = sources.iter().any(|s| s.is_healthy);
    let metrics = state.metrics.snapshot().await;
    let history_entries = state.history.read().await.len();

    let response = DetailedHealthResponse {
        status: if any_healthy { "healthy".to_string() } else { "degraded".to_string() },
        version: env!("CARGO_PKG_VERSION").to_string(),
        sources,
        history_entries,
        metrics: HealthMetrics {
            uptime_secs: metrics.uptime_secs,
            counters: metrics.counters,
            means: metrics.means,
        },
    };

    let status = if any_healthy {
        StatusCode::OK
    } else {
        tracing::warn!("Health check degraded: no healthy history source");
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

#[derive(Serialize)]
pub struct DetailedHealthResponse {
    pub status: String,
    pub version: String,
    pub sources: Vec<SourceHealth>,
    pub history_entries: usize,
    pub metrics: HealthMetrics,
}

#[derive(Serialize)]
pub struct HealthMetrics {
    pub uptime_secs: u64,
    pub counters: HashMap<String, u64>,
    pub means: HashMap<String, f64>,
}
