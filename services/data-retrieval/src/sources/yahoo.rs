use crate::normalizers::{bars_from_columns, validate_history};
use crate::types::*;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const SOURCE_NAME: &str = "yahoo_finance";

/// Outcome tracking so health() never costs a request
struct HealthTracker {
    /// Timestamp of last successful request (millis since epoch)
    last_success_ms: AtomicU64,
    /// Timestamp of last failed request (millis since epoch)
    last_failure_ms: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    last_latency_ms: AtomicU64,
    last_error: RwLock<Option<String>>,
}

impl HealthTracker {
    fn new() -> Self {
        Self {
            last_success_ms: AtomicU64::new(0),
            last_failure_ms: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            last_latency_ms: AtomicU64::new(0),
            last_error: RwLock::new(None),
        }
    }

    fn record_success(&self, latency_ms: u64) {
        let now_ms = Utc::now().timestamp_millis() as u64;
        self.last_success_ms.store(now_ms, Ordering::Relaxed);
        self.last_latency_ms.store(latency_ms, Ordering::Relaxed);
        self.success_count.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self, error: &DataRetrievalError) {
        let now_ms = Utc::now().timestamp_millis() as u64;
        self.last_failure_ms.store(now_ms, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_error.write() {
            *last = Some(error.to_string());
        }
    }

    fn is_healthy(&self) -> bool {
        let last_success = self.last_success_ms.load(Ordering::Relaxed);
        let last_failure = self.last_failure_ms.load(Ordering::Relaxed);

        // Healthy until the most recent outcome is a failure
        last_failure == 0 || last_success >= last_failure
    }

    fn success_rate(&self) -> f64 {
        let successes = self.success_count.load(Ordering::Relaxed);
        let failures = self.failure_count.load(Ordering::Relaxed);
        let total = successes + failures;
        if total == 0 {
            return 1.0;
        }
        successes as f64 / total as f64
    }
}

/// Yahoo Finance chart API client
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
    health_tracker: HealthTracker,
}

impl YahooFinanceClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://query1.finance.yahoo.com";

    /// Per-request timeout
    const REQUEST_TIMEOUT_SECS: u64 = 10;

    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        // The chart endpoint rejects requests without a browser-like agent
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; wave-forecaster/0.1)")
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| DataRetrievalError::ApiError(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            health_tracker: HealthTracker::new(),
        })
    }

    /// Fetch closing prices, recording the outcome for health reporting
    pub async fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<PriceHistory> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(DataRetrievalError::InvalidParameter("ticker is empty".to_string()));
        }
        // The ticker becomes a path segment
        if let Some(c) = ticker.chars().find(|c| !is_ticker_char(*c)) {
            return Err(DataRetrievalError::InvalidParameter(format!(
                "ticker {} contains unsupported character {:?}",
                ticker, c
            )));
        }
        interval.check_period(period)?;

        let started = Instant::now();
        let outcome = self.request_history(&ticker, period, interval).await;

        match &outcome {
            Ok(history) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                self.health_tracker.record_success(latency_ms);
                debug!(
                    ticker = %ticker,
                    bars = history.len(),
                    latency_ms,
                    "fetched price history"
                );
            }
            // The source answered; the ticker is simply unknown
            Err(DataRetrievalError::AssetNotFound(_)) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                self.health_tracker.record_success(latency_ms);
            }
            Err(e) => {
                warn!("Yahoo Finance request for {} failed: {}", ticker, e);
                self.health_tracker.record_failure(e);
            }
        }

        outcome
    }

    async fn request_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<PriceHistory> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let request = self
            .client
            .get(&url)
            .query(&[("range", period.as_str()), ("interval", interval.as_str())])
            .send();

        let response = match tokio::time::timeout(
            Duration::from_secs(Self::REQUEST_TIMEOUT_SECS),
            request,
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => return Err(DataRetrievalError::ApiError(e.to_string())),
            Err(_) => {
                return Err(DataRetrievalError::ApiError(format!(
                    "Yahoo Finance request for {} timed out after {}s",
                    ticker,
                    Self::REQUEST_TIMEOUT_SECS
                )))
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(DataRetrievalError::RateLimit {
                source_name: SOURCE_NAME.to_string(),
                retry_after,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| DataRetrievalError::InvalidResponse(e.to_string()))?;

        // Error bodies share the chart envelope, so parse before judging status
        let parsed: ChartResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(DataRetrievalError::InvalidResponse(e.to_string()))
            }
            Err(_) => {
                return Err(DataRetrievalError::ApiError(format!(
                    "Yahoo Finance API error ({}): {}",
                    status, body
                )))
            }
        };

        if let Some(error) = parsed.chart.error {
            return Err(if error.code == "Not Found" {
                DataRetrievalError::AssetNotFound(ticker.to_string())
            } else {
                DataRetrievalError::ApiError(format!("[{}] {}", error.code, error.description))
            });
        }
        if !status.is_success() {
            return Err(DataRetrievalError::ApiError(format!(
                "Yahoo Finance API error ({})",
                status
            )));
        }

        let data = parsed
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| DataRetrievalError::AssetNotFound(ticker.to_string()))?;

        let closes = data
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let bars = bars_from_columns(&data.timestamp, &closes);
        if bars.is_empty() {
            return Err(DataRetrievalError::AssetNotFound(ticker.to_string()));
        }

        let history = PriceHistory {
            ticker: ticker.to_string(),
            period,
            interval,
            bars,
        };
        validate_history(&history)?;
        Ok(history)
    }

    /// Get health status from tracked outcomes (no API call)
    pub async fn health(&self) -> SourceHealth {
        let last_success_ms = self.health_tracker.last_success_ms.load(Ordering::Relaxed);
        let last_success = if last_success_ms > 0 {
            DateTime::from_timestamp_millis(last_success_ms as i64)
        } else {
            None
        };

        let is_healthy = self.health_tracker.is_healthy();
        let last_error = if is_healthy {
            None
        } else {
            self.health_tracker
                .last_error
                .read()
                .ok()
                .and_then(|e| e.clone())
        };

        SourceHealth {
            source: SOURCE_NAME.to_string(),
            is_healthy,
            last_success,
            last_error,
            success_rate: self.health_tracker.success_rate(),
            last_latency_ms: self.health_tracker.last_latency_ms.load(Ordering::Relaxed),
        }
    }
}

// Chart API response envelope
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Symbols such as `BRK-B`, `^GSPC` and `EURUSD=X`
fn is_ticker_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '^' | '=' | '-')
}

#[async_trait::async_trait]
impl PriceHistorySource for YahooFinanceClient {
    async fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<PriceHistory> {
        YahooFinanceClient::fetch_history(self, ticker, period, interval).await
    }

    async fn health(&self) -> SourceHealth {
        YahooFinanceClient::health(self).await
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}
