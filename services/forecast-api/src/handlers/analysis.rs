//! Analysis endpoints - fetch or accept prices, run the wave pipeline

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use data_retrieval::{DataRetrievalError, Interval, Period};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use wave_engine::{AnalysisReport, ForecastOutcome, HistoryEntry, WaveAnalyzer, WaveEngineError};

use crate::observability::metrics;
use crate::settings::{MAX_THRESHOLD_PCT, MIN_THRESHOLD_PCT};
use crate::AppState;

/// Ticker recorded in history for caller-supplied series without one
const CUSTOM_SERIES_TICKER: &str = "CUSTOM";

type ApiError = (StatusCode, String);

/// Request to analyze a ticker's recent closes
#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub ticker: String,
    /// "1mo", "3mo", "6mo", "1y" or "2y"
    pub period: Option<String>,
    /// "15m", "30m", "1h", "1d" or "1wk"
    pub interval: Option<String>,
    /// Zigzag threshold in percent
    pub threshold_pct: Option<f64>,
}

/// Request to analyze a caller-supplied close series
#[derive(Debug, Deserialize)]
pub struct PricesAnalysisRequest {
    pub ticker: Option<String>,
    pub prices: Vec<f64>,
    pub threshold_pct: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<Interval>,
    pub threshold_pct: f64,
    pub bars: usize,
    /// Bar times, index-aligned with pivot and wave indices
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub timestamps: Vec<DateTime<Utc>>,
    pub report: AnalysisReport,
    pub summary: Vec<String>,
}

/// POST /v1/analysis - fetch history and analyze it
pub async fn analyze_ticker(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    state.metrics.increment(metrics::ANALYSIS_REQUESTS, 1).await;

    let period: Period = parse_or_default(req.period.as_deref())?;
    let interval: Interval = parse_or_default(req.interval.as_deref())?;
    let threshold_pct = resolve_threshold(&state, req.threshold_pct)?;

    let history = match state.retriever.fetch_history(&req.ticker, period, interval).await {
        Ok(history) => history,
        Err(e) => {
            state.metrics.increment(metrics::RETRIEVAL_ERRORS, 1).await;
            return Err(retrieval_error(e));
        }
    };
    debug!(
        ticker = %history.ticker,
        bars = history.len(),
        from = ?history.first_timestamp(),
        to = ?history.last_timestamp(),
        "history retrieved"
    );

    let report = run_analysis(&state, history.closes(), threshold_pct).await?;
    record_forecast(&state, &history.ticker, &report).await;

    Ok(Json(AnalysisResponse {
        summary: report.summary(),
        ticker: history.ticker,
        period: Some(period),
        interval: Some(interval),
        threshold_pct,
        bars: history.bars.len(),
        timestamps: history.bars.iter().map(|b| b.timestamp).collect(),
        report,
    }))
}

/// POST /v1/analysis/prices - analyze prices sent in the request
pub async fn analyze_prices(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PricesAnalysisRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    state.metrics.increment(metrics::ANALYSIS_REQUESTS, 1).await;

    let threshold_pct = resolve_threshold(&state, req.threshold_pct)?;
    if let Some(bad) = req.prices.iter().find(|p| !p.is_finite() || **p <= 0.0) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("prices must be positive numbers, got {}", bad),
        ));
    }

    let ticker = req
        .ticker
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| CUSTOM_SERIES_TICKER.to_string());

    let bars = req.prices.len();
    let report = run_analysis(&state, req.prices, threshold_pct).await?;
    record_forecast(&state, &ticker, &report).await;

    Ok(Json(AnalysisResponse {
        summary: report.summary(),
        ticker,
        period: None,
        interval: None,
        threshold_pct,
        bars,
        timestamps: Vec::new(),
        report,
    }))
}

fn parse_or_default<T>(value: Option<&str>) -> Result<T, ApiError>
where
    T: FromStr<Err = DataRetrievalError> + Default,
{
    match value {
        Some(s) => s.parse().map_err(retrieval_error),
        None => Ok(T::default()),
    }
}

fn resolve_threshold(state: &AppState, requested: Option<f64>) -> Result<f64, ApiError> {
    let pct = requested.unwrap_or(state.settings.default_threshold_pct);
    if !pct.is_finite() || !(MIN_THRESHOLD_PCT..=MAX_THRESHOLD_PCT).contains(&pct) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "threshold_pct must be between {} and {}, got {}",
                MIN_THRESHOLD_PCT, MAX_THRESHOLD_PCT, pct
            ),
        ));
    }
    Ok(pct)
}

/// Run the pipeline off the async workers
async fn run_analysis(
    state: &AppState,
    prices: Vec<f64>,
    threshold_pct: f64,
) -> Result<AnalysisReport, ApiError> {
    let analyzer = WaveAnalyzer::new(state.settings.analysis_config(threshold_pct));
    let started = Instant::now();

    let outcome = tokio::task::spawn_blocking(move || analyzer.analyze(&prices))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Analysis task failed: {}", e),
            )
        })?;

    state
        .metrics
        .histogram(
            metrics::ANALYSIS_DURATION_MS,
            started.elapsed().as_secs_f64() * 1000.0,
        )
        .await;

    match outcome {
        Ok(report) => Ok(report),
        Err(e) => {
            state.metrics.increment(metrics::ANALYSIS_FAILED, 1).await;
            warn!("Analysis aborted: {}", e);
            Err(engine_error(e))
        }
    }
}

/// Append ready forecasts to the session history
async fn record_forecast(state: &AppState, ticker: &str, report: &AnalysisReport) {
    match &report.forecast {
        ForecastOutcome::Ready(result) => {
            let entries = {
                let mut history = state.history.write().await;
                history.append(HistoryEntry::from_forecast(ticker, result, Utc::now()));
                history.len()
            };
            state.metrics.increment(metrics::FORECASTS_READY, 1).await;
            state.metrics.gauge(metrics::HISTORY_ENTRIES, entries as f64).await;
        }
        ForecastOutcome::Unavailable { reason } => {
            state.metrics.increment(metrics::FORECASTS_UNAVAILABLE, 1).await;
            info!(ticker = %ticker, reason = %reason, "forecast unavailable");
        }
    }
}

fn retrieval_error(e: DataRetrievalError) -> ApiError {
    let status = match e {
        DataRetrievalError::AssetNotFound(_) => StatusCode::NOT_FOUND,
        DataRetrievalError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        DataRetrievalError::ApiError(_)
        | DataRetrievalError::RateLimit { .. }
        | DataRetrievalError::InvalidResponse(_)
        | DataRetrievalError::SourceUnhealthy(_) => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

fn engine_error(e: WaveEngineError) -> ApiError {
    let status = match e {
        WaveEngineError::InvalidThreshold(_) | WaveEngineError::EmptySeries => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, e.to_string())
}
