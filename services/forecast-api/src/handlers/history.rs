//! Forecast history endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wave_engine::{HistoryEntry, WaveLabel};

use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Only entries for this ticker (case-insensitive)
    pub ticker: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryRow {
    pub time: String,
    pub ticker: String,
    pub label: WaveLabel,
    pub forecast_pct: f64,
}

impl From<&HistoryEntry> for HistoryRow {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            time: entry.formatted_time(),
            ticker: entry.ticker.clone(),
            label: entry.label,
            forecast_pct: entry.forecast_pct,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryRow>,
    pub total: usize,
}

/// GET /v1/history - forecasts made since startup, oldest first
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let history = state.history.read().await;
    let entries: Vec<HistoryRow> = match query.ticker.as_deref() {
        Some(ticker) => history.for_ticker(ticker).map(HistoryRow::from).collect(),
        None => history.entries().iter().map(HistoryRow::from).collect(),
    };

    Json(HistoryResponse {
        total: history.len(),
        entries,
    })
}
