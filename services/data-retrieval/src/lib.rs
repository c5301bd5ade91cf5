pub mod types;
pub mod sources {
    pub mod yahoo;
}
pub mod normalizers;

pub use types::*;
pub use sources::yahoo::YahooFinanceClient;

use std::sync::Arc;
use tracing::{info, warn};

/// Ordered list of history sources; the first one that answers wins
#[derive(Clone, Default)]
pub struct HistoryRetriever {
    sources: Vec<Arc<dyn PriceHistorySource>>,
}

impl HistoryRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Arc<dyn PriceHistorySource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Fetch history from the first source that succeeds.
    ///
    /// Unknown tickers and bad parameters are returned immediately since
    /// another source would not change the answer.
    pub async fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<PriceHistory> {
        if self.sources.is_empty() {
            return Err(DataRetrievalError::SourceUnhealthy(
                "No history sources configured".to_string(),
            ));
        }

        let mut last_error = None;
        for source in &self.sources {
            match source.fetch_history(ticker, period, interval).await {
                Ok(history) => {
                    info!(
                        source = source.name(),
                        ticker = %history.ticker,
                        bars = history.len(),
                        period = %period,
                        interval = %interval,
                        "price history retrieved"
                    );
                    return Ok(history);
                }
                Err(e @ DataRetrievalError::AssetNotFound(_))
                | Err(e @ DataRetrievalError::InvalidParameter(_)) => return Err(e),
                Err(e) => {
                    warn!("Source {} failed for {}: {}", source.name(), ticker, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DataRetrievalError::SourceUnhealthy("All sources failed".to_string())
        }))
    }

    /// Get health status of all sources
    pub async fn health_check(&self) -> Vec<SourceHealth> {
        let mut healths = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            healths.push(source.health().await);
        }
        healths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource {
        name: &'static str,
        response: fn(&str) -> Result<PriceHistory>,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn new(name: &'static str, response: fn(&str) -> Result<PriceHistory>) -> Arc<Self> {
            Arc::new(Self {
                name,
                response,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl PriceHistorySource for FixedSource {
        async fn fetch_history(&self, ticker: &str, _: Period, _: Interval) -> Result<PriceHistory> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.response)(ticker)
        }

        async fn health(&self) -> SourceHealth {
            SourceHealth {
                source: self.name.to_string(),
                is_healthy: true,
                last_success: None::<DateTime<Utc>>,
                last_error: None,
                success_rate: 1.0,
                last_latency_ms: 0,
            }
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    fn ok(ticker: &str) -> Result<PriceHistory> {
        Ok(PriceHistory {
            ticker: ticker.to_string(),
            period: Period::default(),
            interval: Interval::default(),
            bars: vec![PriceBar {
                timestamp: Utc::now(),
                close: 10.0,
            }],
        })
    }

    fn down(_: &str) -> Result<PriceHistory> {
        Err(DataRetrievalError::ApiError("connection refused".to_string()))
    }

    fn missing(ticker: &str) -> Result<PriceHistory> {
        Err(DataRetrievalError::AssetNotFound(ticker.to_string()))
    }

    #[tokio::test]
    async fn test_falls_back_to_next_source() {
        let primary = FixedSource::new("primary", down);
        let backup = FixedSource::new("backup", ok);
        let retriever = HistoryRetriever::new()
            .with_source(primary.clone())
            .with_source(backup.clone());

        let history = retriever
            .fetch_history("MSFT", Period::default(), Interval::default())
            .await
            .unwrap();
        assert_eq!(history.ticker, "MSFT");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(backup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_not_found_stops_fallback() {
        let primary = FixedSource::new("primary", missing);
        let backup = FixedSource::new("backup", ok);
        let retriever = HistoryRetriever::new()
            .with_source(primary)
            .with_source(backup.clone());

        let err = retriever
            .fetch_history("ZZZZ", Period::default(), Interval::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DataRetrievalError::AssetNotFound(_)));
        assert_eq!(backup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_sources_down_returns_last_error() {
        let retriever = HistoryRetriever::new()
            .with_source(FixedSource::new("a", down))
            .with_source(FixedSource::new("b", down));
        let err = retriever
            .fetch_history("SPY", Period::default(), Interval::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DataRetrievalError::ApiError(_)));
        assert_eq!(retriever.health_check().await.len(), 2);
    }

    #[tokio::test]
    async fn test_no_sources() {
        let err = HistoryRetriever::new()
            .fetch_history("SPY", Period::default(), Interval::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DataRetrievalError::SourceUnhealthy(_)));
    }
}
